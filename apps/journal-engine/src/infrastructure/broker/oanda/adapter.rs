//! OANDA ledger adapter implementing the ledger ports.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::application::ports::{LedgerError, TradeLedgerPort, TransactionLogPort};
use crate::domain::market::{AccountRef, AccountSummary, Candle, Granularity, Instrument};
use crate::domain::shared::{AccountId, TradeId, TransactionId};
use crate::domain::trade::{LedgerTrade, sort_most_recent_first};
use crate::domain::transaction::TransactionRecord;

use super::api_types::{
    AccountSummaryResponse, AccountsResponse, CandlesResponse, InstrumentsResponse, OandaCandle,
    OandaTransaction, TradeResponse, TradesResponse, TransactionPagesResponse,
    TransactionResponse, TransactionsResponse, parse_transaction_id,
};
use super::config::{OandaConfig, OandaEnvironment};
use super::error::OandaError;
use super::http_client::OandaHttpClient;

/// Page size for trade list requests (OANDA maximum).
const TRADE_PAGE_SIZE: u32 = 500;

/// OANDA v20 adapter.
///
/// Implements `TradeLedgerPort` and `TransactionLogPort` for one account.
#[derive(Debug, Clone)]
pub struct OandaLedgerAdapter {
    client: OandaHttpClient,
    account_id: AccountId,
    environment: OandaEnvironment,
}

impl OandaLedgerAdapter {
    /// Create a new OANDA adapter.
    pub fn new(config: OandaConfig) -> Result<Self, OandaError> {
        let client = OandaHttpClient::new(&config)?;
        tracing::info!(
            account_id = %config.account_id,
            environment = %config.environment,
            "OANDA ledger adapter created"
        );
        Ok(Self {
            client,
            account_id: config.account_id,
            environment: config.environment,
        })
    }

    /// Account this adapter reads.
    #[must_use]
    pub const fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Check if this adapter points at the live environment.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.environment.is_live()
    }

    fn account_path(&self, suffix: &str) -> String {
        format!("/v3/accounts/{}{suffix}", self.account_id)
    }

    /// Every trade in `state`, paging backwards with `beforeID` until a short page.
    async fn trades_in_state(&self, state: &str) -> Result<Vec<LedgerTrade>, OandaError> {
        let mut trades = Vec::new();
        let mut before: Option<u64> = None;
        loop {
            let mut query = vec![
                ("state", state.to_string()),
                ("count", TRADE_PAGE_SIZE.to_string()),
            ];
            if let Some(id) = before {
                query.push(("beforeID", id.to_string()));
            }
            let response: TradesResponse = self
                .client
                .get_with_query(&self.account_path("/trades"), &query)
                .await?;

            let page_len = response.trades.len();
            let oldest = response
                .trades
                .iter()
                .filter_map(|trade| trade.id.parse::<u64>().ok())
                .min();
            trades.extend(response.trades.iter().map(|trade| trade.to_ledger_trade()));

            if page_len < TRADE_PAGE_SIZE as usize {
                break;
            }
            match oldest {
                // A server that ignores beforeID would repeat the page forever.
                Some(id) if before.is_none_or(|previous| id < previous) => {
                    tracing::debug!(state, before_id = id, "Fetching next trade page");
                    before = Some(id);
                }
                _ => break,
            }
        }
        Ok(trades)
    }

    /// Accounts visible to the token.
    pub async fn list_accounts(&self) -> Result<Vec<AccountRef>, OandaError> {
        let response: AccountsResponse = self.client.get("/v3/accounts").await?;
        Ok(response
            .accounts
            .into_iter()
            .map(|a| a.into_domain())
            .collect())
    }

    /// Balance snapshot of the configured account.
    pub async fn account_summary(&self) -> Result<AccountSummary, OandaError> {
        let response: AccountSummaryResponse =
            self.client.get(&self.account_path("/summary")).await?;
        Ok(response.account.into_domain())
    }

    /// Instruments tradeable on the configured account.
    pub async fn instruments(&self) -> Result<Vec<Instrument>, OandaError> {
        let response: InstrumentsResponse =
            self.client.get(&self.account_path("/instruments")).await?;
        Ok(response
            .instruments
            .into_iter()
            .map(|i| i.into_domain())
            .collect())
    }

    /// Mid-price candles for `instrument` between `from` and `to`.
    pub async fn candles(
        &self,
        instrument: &str,
        granularity: Granularity,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Candle>, OandaError> {
        let response: CandlesResponse = self
            .client
            .get_with_query(
                &format!("/v3/instruments/{instrument}/candles"),
                &[
                    ("granularity", granularity.as_str().to_string()),
                    ("from", from.to_rfc3339_opts(SecondsFormat::Secs, true)),
                    ("to", to.to_rfc3339_opts(SecondsFormat::Secs, true)),
                    ("price", "M".to_string()),
                ],
            )
            .await?;
        Ok(response
            .candles
            .into_iter()
            .filter_map(OandaCandle::into_domain)
            .collect())
    }
}

#[async_trait]
impl TradeLedgerPort for OandaLedgerAdapter {
    async fn fetch_trades(&self) -> Result<Vec<LedgerTrade>, LedgerError> {
        let mut trades = self.trades_in_state("OPEN").await?;
        let closed = self.trades_in_state("CLOSED").await?;
        trades.extend(closed);
        sort_most_recent_first(&mut trades);

        tracing::debug!(
            account_id = %self.account_id,
            count = trades.len(),
            "Fetched trade ledger"
        );
        Ok(trades)
    }
}

#[async_trait]
impl TransactionLogPort for OandaLedgerAdapter {
    async fn transaction(&self, id: TransactionId) -> Result<TransactionRecord, LedgerError> {
        let response: TransactionResponse = self
            .client
            .get(&self.account_path(&format!("/transactions/{id}")))
            .await?;
        Ok(response.transaction.into_record()?)
    }

    async fn transaction_range(
        &self,
        from: TransactionId,
        to: TransactionId,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let response: TransactionsResponse = self
            .client
            .get_with_query(
                &self.account_path("/transactions/idrange"),
                &[("from", from.to_string()), ("to", to.to_string())],
            )
            .await?;
        let records = response
            .transactions
            .into_iter()
            .map(OandaTransaction::into_record)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn latest_transaction_id(&self) -> Result<TransactionId, LedgerError> {
        let response: TransactionPagesResponse =
            self.client.get(&self.account_path("/transactions")).await?;
        Ok(parse_transaction_id(&response.last_transaction_id)?)
    }

    async fn closing_transaction_ids(
        &self,
        trade_id: &TradeId,
    ) -> Result<Vec<TransactionId>, LedgerError> {
        let response: TradeResponse = self
            .client
            .get(&self.account_path(&format!("/trades/{trade_id}")))
            .await?;
        Ok(response.trade.closing_ids()?)
    }
}
