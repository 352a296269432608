use chrono::Utc;
use uuid::Uuid;

use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{
    AddTransactionCmd, EngineError, ResultEngine, Transaction, UpdateTransactionCmd, transactions,
};

use super::super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Creates a transaction and applies its signed effect to the wallet
    /// balance, as one atomic unit.
    ///
    /// No floor check is performed here: an expense may drive the wallet
    /// negative. Only income *reversals* (see [`Engine::delete_transaction`])
    /// are floor-checked.
    pub async fn add_transaction(&self, cmd: AddTransactionCmd) -> ResultEngine<Uuid> {
        let name = normalize_required_name(&cmd.name, "transaction")?;
        with_tx!(self, |db_tx| {
            let wallet = self.require_wallet(&db_tx, cmd.wallet_id).await?;
            if let Some(category_id) = cmd.category_id {
                self.require_category_of_kind(&db_tx, category_id, cmd.kind)
                    .await?;
            }

            let tx = Transaction::new(
                name,
                cmd.amount_minor,
                cmd.kind,
                cmd.category_id,
                cmd.wallet_id,
                cmd.occurred_at,
                Utc::now(),
            )?;
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;

            let new_balance = wallet.balance_minor + tx.signed_effect();
            self.persist_wallet_balance(&db_tx, cmd.wallet_id, new_balance)
                .await?;

            tracing::debug!(
                transaction = %tx.id,
                wallet = %cmd.wallet_id,
                effect = tx.signed_effect(),
                "transaction added"
            );
            Ok(tx.id)
        })
    }

    /// Updates an existing transaction, reversing the old balance effect and
    /// applying the new one in a single atomic unit.
    ///
    /// `cmd.old` is the caller-supplied pre-edit snapshot; its inverse is the
    /// rollback applied to the old wallet. When the wallet assignment
    /// changed, both wallets are rebalanced; a negative intermediate or final
    /// balance fails the whole operation with neither wallet mutated.
    pub async fn update_transaction(&self, cmd: UpdateTransactionCmd) -> ResultEngine<()> {
        let name = normalize_required_name(&cmd.name, "transaction")?;
        if cmd.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let tx_model = transactions::Entity::find_by_id(cmd.transaction_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;

            let old_wallet = self.require_wallet(&db_tx, cmd.old.wallet_id).await?;
            if let Some(category_id) = cmd.category_id {
                self.require_category_of_kind(&db_tx, category_id, cmd.kind)
                    .await?;
            }

            let rollback = -cmd.old.kind.signed_effect(cmd.old.amount_minor);
            let commit = cmd.kind.signed_effect(cmd.amount_minor);

            if cmd.old.wallet_id == cmd.wallet_id {
                let candidate = old_wallet.balance_minor + rollback + commit;
                if candidate < 0 {
                    return Err(EngineError::InsufficientFunds(old_wallet.name));
                }
                self.persist_wallet_balance(&db_tx, cmd.wallet_id, candidate)
                    .await?;
            } else {
                // Reverse on the old wallet first; a negative result here
                // means the snapshot no longer matches the stored state.
                let old_candidate = old_wallet.balance_minor + rollback;
                if old_candidate < 0 {
                    return Err(EngineError::InsufficientFunds(old_wallet.name));
                }
                self.persist_wallet_balance(&db_tx, cmd.old.wallet_id, old_candidate)
                    .await?;

                let new_wallet = self.require_wallet(&db_tx, cmd.wallet_id).await?;
                let new_candidate = new_wallet.balance_minor + commit;
                if new_candidate < 0 {
                    // The surrounding transaction also rolls back the old
                    // wallet's reversal.
                    return Err(EngineError::InsufficientFunds(new_wallet.name));
                }
                self.persist_wallet_balance(&db_tx, cmd.wallet_id, new_candidate)
                    .await?;
            }

            let tx_active = transactions::ActiveModel {
                id: ActiveValue::Set(tx_model.id),
                name: ActiveValue::Set(name),
                amount_minor: ActiveValue::Set(cmd.amount_minor),
                kind: ActiveValue::Set(cmd.kind.as_str().to_string()),
                category_id: ActiveValue::Set(cmd.category_id.map(|id| id.to_string())),
                wallet_id: ActiveValue::Set(cmd.wallet_id.to_string()),
                occurred_at: ActiveValue::Set(cmd.occurred_at),
                ..Default::default()
            };
            tx_active.update(&db_tx).await?;

            tracing::debug!(transaction = %cmd.transaction_id, "transaction updated");
            Ok(())
        })
    }

    /// Deletes a transaction and reverses its balance effect atomically.
    ///
    /// Reversing an income may not push the wallet negative; reversing an
    /// expense only increases the balance and always proceeds.
    pub async fn delete_transaction(&self, transaction_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let tx_model = transactions::Entity::find_by_id(transaction_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
            let tx = Transaction::try_from(tx_model)?;

            let wallet = self.require_wallet(&db_tx, tx.wallet_id).await?;

            let reversal = -tx.signed_effect();
            let candidate = wallet.balance_minor + reversal;
            if tx.kind == crate::EntryKind::Income && candidate < 0 {
                return Err(EngineError::InsufficientFunds(wallet.name));
            }

            self.persist_wallet_balance(&db_tx, tx.wallet_id, candidate)
                .await?;
            transactions::Entity::delete_by_id(transaction_id.to_string())
                .exec(&db_tx)
                .await?;

            tracing::debug!(transaction = %transaction_id, "transaction deleted");
            Ok(())
        })
    }
}
