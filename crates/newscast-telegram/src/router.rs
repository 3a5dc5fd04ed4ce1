use std::{
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use anyhow::Context;
use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use newscast_core::{
    broadcast::Broadcaster,
    config::Config,
    messaging::port::MessagingPort,
    ports::Notifier,
    report::LogChannelNotifier,
    transport::{throttled::ThrottledTransport, Transport},
};
use newscast_store::SqliteChatStore;

use crate::{handlers, TelegramMessenger, TelegramTransport};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub store: SqliteChatStore,
    pub messenger: Arc<dyn MessagingPort>,
    pub notifier: Arc<dyn Notifier>,
    pub broadcaster: Broadcaster,
    pub broadcasts: Arc<ActiveBroadcasts>,
    pub bot_username: String,
    pub bot_id: teloxide::types::UserId,
}

impl AppState {
    /// Best-effort log-channel entry; failures are only logged locally.
    pub async fn log(&self, text: &str) {
        if let Err(e) = self.notifier.send_log(text).await {
            tracing::error!(error = %e, "failed to send message to log channel");
        }
    }
}

/// Cancellation handles of the broadcasts currently running.
#[derive(Default)]
pub struct ActiveBroadcasts {
    next_id: AtomicU64,
    running: Mutex<HashMap<u64, CancellationToken>>,
}

impl ActiveBroadcasts {
    pub async fn register(&self) -> (u64, CancellationToken) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        self.running.lock().await.insert(id, token.clone());
        (id, token)
    }

    pub async fn finish(&self, id: u64) {
        self.running.lock().await.remove(&id);
    }

    /// Run `job` on its own task, with a cancel token registered until it returns.
    ///
    /// The token is registered before this returns, so a `/cancel` handled after
    /// the spawning handler (even from the same chat) reaches the run.
    pub async fn spawn<F, Fut>(self: &Arc<Self>, job: F) -> JoinHandle<()>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (id, token) = self.register().await;
        let run = job(token);
        let active = Arc::clone(self);
        tokio::spawn(async move {
            run.await;
            active.finish(id).await;
        })
    }

    /// Cancel every running broadcast; returns how many were signalled.
    pub async fn cancel_all(&self) -> usize {
        let running = self.running.lock().await;
        for token in running.values() {
            token.cancel();
        }
        running.len()
    }
}

pub async fn run_polling(cfg: Arc<Config>, store: SqliteChatStore) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let me = bot
        .get_me()
        .await
        .context("failed to fetch bot identity (check TELEGRAM_BOT_TOKEN)")?;
    tracing::info!(username = me.username(), "news bot started");
    tracing::info!(admins = cfg.admin_ids.len(), log_channel = cfg.log_channel_id.0, "configuration loaded");

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let notifier: Arc<dyn Notifier> = Arc::new(LogChannelNotifier::new(
        messenger.clone(),
        cfg.log_channel_id,
    ));

    // Throttle fan-out sends to stay under Telegram flood limits; the raw transport
    // itself never retries.
    let raw_transport: Arc<dyn Transport> = Arc::new(TelegramTransport::new(bot.clone()));
    let transport: Arc<dyn Transport> =
        Arc::new(ThrottledTransport::new(raw_transport, cfg.throttle));
    let broadcaster = Broadcaster::new(Arc::new(store.clone()), transport);

    let state = Arc::new(AppState {
        cfg: cfg.clone(),
        store,
        messenger,
        notifier,
        broadcaster,
        broadcasts: Arc::new(ActiveBroadcasts::default()),
        bot_username: me.username().to_string(),
        bot_id: me.id,
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state.clone()])
        .build();

    let shutdown = dispatcher.shutdown_token();
    let broadcasts = state.broadcasts.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let n = broadcasts.cancel_all().await;
            tracing::info!(cancelled_broadcasts = n, "shutdown requested");
            if let Ok(done) = shutdown.shutdown() {
                done.await;
            }
        }
    });

    dispatcher.dispatch().await;
    tracing::info!("dispatcher stopped");

    Ok(())
}
