//! RunRace Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;
use std::time::Duration;
use teloxide::{prelude::*, types::Update};
use teloxide::dispatching::UpdateHandler;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn, error};

use RunRace::{
    config::Settings,
    utils::logging,
    database::{DatabaseService, connection::{self, create_pool, run_migrations}},
    services::{Clock, ServiceFactory, SystemClock},
    state::{ScenarioManager, StateStorage},
    i18n::I18n,
    middleware::RateLimitMiddleware,
    handlers::{AppContext, Command, handle_command, handle_callback_query, handle_message},
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Keep the guard alive or the file writer stops flushing
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!(version = RunRace::VERSION, "Starting RunRace Telegram Bot...");

    info!("Connecting to database...");
    let db_pool = create_pool(&connection::DatabaseConfig::from(&settings.database)).await?;
    run_migrations(&db_pool).await?;
    let database_service = DatabaseService::new(db_pool);

    info!("Loading translations...");
    let mut i18n = I18n::new(&settings.i18n);
    i18n.load_translations().await?;

    info!("Connecting to Redis...");
    let state_storage = StateStorage::new(settings.redis.clone()).await?;
    state_storage.health_check().await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new(settings.registration.utc_offset_hours)?);
    info!(today = %clock.today(), utc_offset_hours = settings.registration.utc_offset_hours, "Registration calendar ready");

    let rate_limiter = Arc::new(RateLimitMiddleware::new(&settings.rate_limit, &settings.bot.admin_ids)?);
    spawn_rate_limit_cleanup(rate_limiter.clone(), settings.rate_limit.window_seconds);

    let bot = Bot::new(&settings.bot.token);

    info!("Initializing services...");
    let services = ServiceFactory::new(settings.clone(), database_service, clock);

    let ctx = AppContext {
        services: Arc::new(services),
        scenario_manager: Arc::new(ScenarioManager::new()),
        state_storage: Arc::new(state_storage),
        i18n: Arc::new(i18n),
        rate_limiter,
    };

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to publish command list");
    }

    let mut dispatcher = Dispatcher::builder(bot, create_handler())
        .dependencies(dptree::deps![ctx])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.kind);
        })
        .enable_ctrlc_handler()
        .build();

    info!("RunRace bot is ready, starting polling");
    dispatcher.dispatch().await;

    info!("RunRace bot has been shut down.");
    Ok(())
}

/// Periodically forget users whose rate limit quota has refilled
fn spawn_rate_limit_cleanup(rate_limiter: Arc<RateLimitMiddleware>, window_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(window_seconds.max(1)));
        loop {
            interval.tick().await;
            rate_limiter.cleanup();
        }
    });
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_commands),
                )
                .branch(dptree::endpoint(handle_messages)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callbacks))
}

async fn handle_commands(bot: Bot, msg: Message, cmd: Command, ctx: AppContext) -> HandlerResult {
    if let Err(e) = handle_command(bot, msg, cmd.clone(), ctx).await {
        error!(command = ?cmd, error = %e, "Error handling command");
        return Err(e.into());
    }

    Ok(())
}

async fn handle_messages(bot: Bot, msg: Message, ctx: AppContext) -> HandlerResult {
    if let Err(e) = handle_message(bot, msg, ctx).await {
        error!(error = %e, "Error handling message");
        return Err(e.into());
    }

    Ok(())
}

async fn handle_callbacks(bot: Bot, query: CallbackQuery, ctx: AppContext) -> HandlerResult {
    let user_id = query.from.id.0 as i64;

    if let Err(e) = handle_callback_query(bot, query, ctx).await {
        error!(user_id = user_id, error = %e, "Error handling callback query");
        return Err(e.into());
    }

    Ok(())
}
