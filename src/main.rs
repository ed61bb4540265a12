use std::convert::TryFrom;
use std::sync::Arc;

use futures::StreamExt;
use hyper::{Client, Uri};
use hyper::client::HttpConnector;
use hyper_socks2::SocksConnector;
use telegram_bot::*;
use telegram_bot::connector::Connector;
use telegram_bot::connector::hyper::{default_connector, HyperConnector};
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use inline_games::config::Config;
use inline_games::error::{ConfigError, SessionError, StoreError};
use inline_games::keyboard::Keyboard;
use inline_games::{FileStore, GameKind, MemoryStore, Player, Registry, SessionManager, SessionStore};

#[derive(Error, Debug)]
enum BotError {
    #[error(transparent)]
    Telegram(#[from] telegram_bot::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("transition task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("invalid proxy: {0}")]
    Proxy(String),
}

fn to_inline_keyboard(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    let mut inline_keyboard = InlineKeyboardMarkup::new();
    for row in keyboard.rows() {
        inline_keyboard.add_row(row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.as_str(), b.action.as_str()))
            .collect());
    }
    inline_keyboard
}

fn to_player(user: &User) -> Player {
    Player::new(user.id.to_string(), user.username.clone().unwrap_or_else(|| user.first_name.clone()))
}

fn parse_command(data: &str) -> Option<GameKind> {
    let command = data.split_whitespace().next()?;
    let command = command.split('@').next()?;
    match command {
        "/checkers" => Some(GameKind::Checkers),
        "/pool" => Some(GameKind::PoolCheckers),
        _ => None,
    }
}

struct GameManager<'a> {
    api: &'a Api,
    sessions: Arc<SessionManager>,
}

impl<'a> GameManager<'a> {
    fn new(api: &'a Api, sessions: SessionManager) -> GameManager<'a> {
        Self {
            api,
            sessions: Arc::new(sessions),
        }
    }

    async fn handle_update(&self, update: Result<Update, telegram_bot::Error>) -> Result<(), BotError> {
        let update = update?;
        if let UpdateKind::Message(message) = update.kind {
            if let MessageKind::Text { ref data, .. } = message.kind {
                if let Some(kind) = parse_command(data) {
                    let screen = self.sessions.preview(kind)?;
                    self.api.send(message
                        .text_reply(screen.text)
                        .reply_markup(to_inline_keyboard(&screen.keyboard))).await?;
                }
            }
        } else if let UpdateKind::CallbackQuery(query) = update.kind {
            let message = match (&query.message, &query.data) {
                (Some(MessageOrChannelPost::Message(message)), Some(_)) => message.clone(),
                // inline-mode messages have no chat message to edit through this API
                _ => {
                    self.api.send(query.acknowledge()).await?;
                    return Ok(());
                }
            };
            let session_id = format!("{}:{}", message.chat.id(), message.id);
            let token = query.data.clone().unwrap_or_default();
            let actor = to_player(&query.from);

            let sessions = self.sessions.clone();
            let reply = tokio::task::spawn_blocking(move || {
                sessions.receive_action(&session_id, &token, &actor)
            }).await?;

            match reply.notice {
                Some(notice) => {
                    let mut answer = query.answer(notice.text);
                    if notice.alert {
                        answer.show_alert();
                    }
                    self.api.send(answer).await?;
                }
                None => {
                    self.api.send(query.acknowledge()).await?;
                }
            }
            if let Some(screen) = reply.screen {
                // edits that change nothing are refused by the API
                let _ = self.api.send(message
                    .edit_text(screen.text)
                    .reply_markup(to_inline_keyboard(&screen.keyboard))).await;
            }
        }
        Ok(())
    }
}

fn socks5_connector(addr: &str) -> Result<Box<dyn Connector>, BotError> {
    let mut connector = HttpConnector::new();
    connector.enforce_http(false);
    let proxy_addr = Uri::try_from(addr).map_err(|e| BotError::Proxy(e.to_string()))?;
    let connector = SocksConnector {
        proxy_addr,
        auth: None,
        connector,
    }.with_tls().map_err(|e| BotError::Proxy(e.to_string()))?;
    Ok(Box::new(HyperConnector::new(Client::builder().build(connector))))
}

fn open_store(config: &Config) -> Result<Arc<dyn SessionStore>, StoreError> {
    Ok(match &config.store_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "using file session store");
            Arc::new(FileStore::open(dir.clone())?)
        }
        None => {
            warn!("STORE_DIR not set, sessions are kept in memory");
            Arc::new(MemoryStore::new())
        }
    })
}

async fn run() -> Result<(), BotError> {
    let config = Config::from_env()?;
    let connector = match &config.proxy {
        Some(proxy) => socks5_connector(proxy)?,
        None => default_connector()?,
    };
    let api = Api::with_connector(config.require_token()?, connector);

    let sessions = SessionManager::from_config(open_store(&config)?, Registry::standard(), &config);
    let manager = GameManager::new(&api, sessions);

    info!("listening for updates");
    let mut stream = api.stream();
    while let Some(update) = stream.next().await {
        if let Err(e) = manager.handle_update(update).await {
            warn!(error = %e, "failed to handle update");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "bot stopped");
        std::process::exit(1);
    }
}
