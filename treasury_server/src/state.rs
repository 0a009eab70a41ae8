use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use treasury_core::export::dto::{BALANCE_FILE, CURRENCY_FILE, ExportedDailyRow, FRONTEND_DATA_FILE};
use treasury_core::export::handler::{parse_balance, parse_currency, parse_frontend_rows};
use treasury_core::snapshots::dto::{BalanceSnapshot, CurrencySnapshot};

use crate::error::ErrorServer;

#[derive(Clone)]
pub struct ServerState {
    data_dir: PathBuf,
}

impl From<PathBuf> for ServerState {
    fn from(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }
}

impl ServerState {
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub async fn frontend_rows(&self) -> Result<Vec<ExportedDailyRow>, ErrorServer> {
        let bytes = self.read(FRONTEND_DATA_FILE).await?;
        parse_frontend_rows(&bytes).map_err(|e| invalid(FRONTEND_DATA_FILE, e))
    }

    pub async fn currency(&self) -> Result<Vec<CurrencySnapshot>, ErrorServer> {
        let bytes = self.read(CURRENCY_FILE).await?;
        parse_currency(&bytes).map_err(|e| invalid(CURRENCY_FILE, e))
    }

    pub async fn balance(&self) -> Result<Vec<BalanceSnapshot>, ErrorServer> {
        let bytes = self.read(BALANCE_FILE).await?;
        parse_balance(&bytes).map_err(|e| invalid(BALANCE_FILE, e))
    }

    async fn read(&self, file: &str) -> Result<Vec<u8>, ErrorServer> {
        let path = self.data_dir.join(file);
        tokio::fs::read(&path).await.map_err(|e| {
            log::warn!("Cannot read {}: {}", path.display(), e);
            match e.kind() {
                ErrorKind::NotFound => ErrorServer::unavailable(format!(
                    "{} has not been exported yet. Run `treasury-scripts --export`.",
                    file
                )),
                _ => ErrorServer::unavailable(format!("{} could not be read: {}", file, e)),
            }
        })
    }
}

fn invalid(file: &str, err: impl std::fmt::Display) -> ErrorServer {
    log::error!("{} is not valid dashboard data: {}", file, err);
    ErrorServer::unavailable(format!("{} is not valid dashboard data", file))
}
