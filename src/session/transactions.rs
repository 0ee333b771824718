//! Network switching and transaction relay

use super::WalletSession;
use crate::provider::{ModuleCall, RawTransactionOptions, RawTransactionPayload, TransactionRequest};
use crate::{Error, Result};
use chrono::Utc;

/// Decimals of the native SUPRA coin
const SUPRA_DECIMALS: u32 = 8;

/// Convert a decimal amount to base units, e.g. `"1.5"` with 8 decimals
/// becomes `"150000000"`
pub fn parse_units(amount: &str, decimals: u32) -> Result<String> {
    let invalid = || Error::InvalidArgument(format!("Invalid amount: {amount:?}"));

    let amount = amount.trim();
    let (whole, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(Error::InvalidArgument(format!(
            "Amount {amount} has more than {decimals} decimals"
        )));
    }

    let digits = format!("{whole}{fraction:0<width$}", width = decimals as usize);
    let units: u128 = digits.parse().map_err(|_| invalid())?;
    Ok(units.to_string())
}

impl WalletSession {
    pub async fn set_selected_chain_id(&self, chain_id: impl Into<String>) {
        self.inner.state.write().await.selected_chain_id = chain_id.into();
    }

    /// Ask the wallet to move to `chain_id`, or to the selected chain
    ///
    /// Does nothing without a provider or a target chain.
    pub async fn switch_to_chain(&self, chain_id: Option<&str>) -> Result<()> {
        let Some(provider) = self.provider() else {
            return Ok(());
        };
        let target = match chain_id {
            Some(id) => id.to_string(),
            None => self.inner.state.read().await.selected_chain_id.clone(),
        };
        if target.is_empty() {
            return Ok(());
        }

        tracing::info!(chain_id = %target, "Requesting network switch");
        provider.change_network(&target).await?;
        self.network_data().await?;
        Ok(())
    }

    /// Switch to the required chain if the wallet is elsewhere
    pub(super) async fn ensure_required_chain(&self) -> Result<()> {
        let network = self.network_data().await?;
        let required = self.inner.config.required_chain_id.clone();
        if network.chain_id != required {
            tracing::info!(
                current = %network.chain_id,
                required = %required,
                "Wallet on wrong network"
            );
            self.set_selected_chain_id(required.clone()).await;
            self.switch_to_chain(Some(&required)).await?;
        }
        Ok(())
    }

    /// Send a native transfer of `amount` SUPRA
    ///
    /// Returns `Ok(None)` when no wallet is connected.
    pub async fn send_transaction(
        &self,
        to: &str,
        amount: &str,
        data: &str,
    ) -> Result<Option<String>> {
        let Some(provider) = self.provider() else {
            return Ok(None);
        };
        let (from, chain_id) = {
            let state = self.inner.state.read().await;
            match state.active_account() {
                Some(account) => (account.to_string(), state.network.chain_id.clone()),
                None => return Ok(None),
            }
        };

        let tx = TransactionRequest {
            from,
            to: to.to_string(),
            value: parse_units(amount, SUPRA_DECIMALS)?,
            data: data.to_string(),
            chain_id,
        };

        self.set_loading(true).await;
        let result = provider.send_transaction(&tx).await;
        let mut state = self.inner.state.write().await;
        state.loading = false;
        let hash = result?;
        state.record_transaction(hash.clone());
        Ok(hash)
    }

    /// Relay an entry function call to the wallet for approval and submission
    ///
    /// `expiry` is an advisory unix deadline; defaults to now plus
    /// `tx_expiry_secs`. Returns `Ok(None)` for a missing wallet, account or
    /// call target.
    pub async fn send_raw_transaction(
        &self,
        call: ModuleCall,
        expiry: Option<i64>,
    ) -> Result<Option<String>> {
        let provider = self.provider();
        let account = self.active_account().await;
        let (Some(provider), Some(account)) = (provider, account) else {
            tracing::error!(call = ?call, "No wallet connected for transaction");
            return Ok(None);
        };
        if call.module_address.is_empty()
            || call.module_name.is_empty()
            || call.function_name.is_empty()
        {
            tracing::error!(call = ?call, "Invalid transaction parameters");
            return Ok(None);
        }

        self.ensure_required_chain().await?;

        let chain_id = self.inner.config.required_chain_id.clone();
        let to = call.module_address.clone();
        let payload = RawTransactionPayload {
            sender: account.clone(),
            sequence_number: 0,
            call,
            options: RawTransactionOptions {
                tx_expiry_time: expiry
                    .unwrap_or_else(|| Utc::now().timestamp() + self.inner.config.tx_expiry_secs),
            },
        };

        let data = provider.create_raw_transaction_data(&payload).await?;
        let hash = provider
            .send_transaction(&TransactionRequest {
                from: account,
                to,
                value: String::new(),
                data,
                chain_id,
            })
            .await?;

        tracing::info!(tx_hash = ?hash, "Transaction submitted");
        self.inner
            .state
            .write()
            .await
            .record_transaction(hash.clone());
        Ok(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_units_scales() {
        assert_eq!(parse_units("1", 8).unwrap(), "100000000");
        assert_eq!(parse_units("1.5", 8).unwrap(), "150000000");
        assert_eq!(parse_units("0.00000001", 8).unwrap(), "1");
        assert_eq!(parse_units(".25", 2).unwrap(), "25");
        assert_eq!(parse_units("3.", 2).unwrap(), "300");
        assert_eq!(parse_units("2.50000000000", 8).unwrap(), "250000000");
    }

    #[test]
    fn parse_units_rejects_bad_input() {
        assert!(parse_units("", 8).is_err());
        assert!(parse_units(".", 8).is_err());
        assert!(parse_units("-1", 8).is_err());
        assert!(parse_units("1e5", 8).is_err());
        assert!(parse_units("0.000000001", 8).is_err());
    }
}
