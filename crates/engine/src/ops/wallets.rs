use chrono::Utc;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};

use crate::{EngineError, ResultEngine, Wallet, transactions, wallets};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Return a wallet snapshot from the DB.
    pub async fn wallet(&self, wallet_id: Uuid) -> ResultEngine<Wallet> {
        with_tx!(self, |db_tx| {
            let model = self.require_wallet(&db_tx, wallet_id).await?;
            Wallet::try_from(model)
        })
    }

    /// List all wallets, most recently created first.
    pub async fn list_wallets(&self) -> ResultEngine<Vec<Wallet>> {
        with_tx!(self, |db_tx| {
            let models = wallets::Entity::find()
                .order_by_desc(wallets::Column::CreatedAt)
                .order_by_desc(wallets::Column::Id)
                .all(&db_tx)
                .await?;
            models.into_iter().map(Wallet::try_from).collect()
        })
    }

    /// Add a new wallet with an opening balance.
    ///
    /// The opening balance is stored as given; it is prior state, not a
    /// transaction, so it never shows up in listings or reports.
    pub async fn new_wallet(&self, name: &str, balance_minor: i64) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "wallet")?;
        with_tx!(self, |db_tx| {
            self.reject_duplicate_wallet_name(&db_tx, &name, None)
                .await?;

            let wallet = Wallet::new(name, balance_minor, Utc::now());
            let wallet_id = wallet.id;
            wallets::ActiveModel::from(&wallet).insert(&db_tx).await?;

            tracing::debug!(wallet = %wallet_id, "wallet created");
            Ok(wallet_id)
        })
    }

    /// Renames an existing wallet.
    pub async fn rename_wallet(&self, wallet_id: Uuid, new_name: &str) -> ResultEngine<()> {
        let new_name = normalize_required_name(new_name, "wallet")?;
        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, wallet_id).await?;
            self.reject_duplicate_wallet_name(&db_tx, &new_name, Some(wallet_id))
                .await?;

            let active = wallets::ActiveModel {
                id: ActiveValue::Set(wallet_id.to_string()),
                name: ActiveValue::Set(new_name),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Deletes a wallet.
    ///
    /// Fails with [`EngineError::WalletNotEmpty`] while transactions still
    /// reference the wallet; their effects are folded into its balance and
    /// deleting them implicitly would break the ledger invariant.
    pub async fn delete_wallet(&self, wallet_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_wallet(&db_tx, wallet_id).await?;

            let referencing = transactions::Entity::find()
                .filter(transactions::Column::WalletId.eq(wallet_id.to_string()))
                .count(&db_tx)
                .await?;
            if referencing > 0 {
                return Err(EngineError::WalletNotEmpty(model.name));
            }

            wallets::Entity::delete_by_id(wallet_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Sum of all wallet balances, 0 when no wallet exists.
    pub async fn total_balance(&self) -> ResultEngine<i64> {
        with_tx!(self, |db_tx| {
            let models = wallets::Entity::find().all(&db_tx).await?;
            Ok(models.iter().map(|m| m.balance_minor).sum())
        })
    }

    pub(super) async fn require_wallet(
        &self,
        db_tx: &DatabaseTransaction,
        wallet_id: Uuid,
    ) -> ResultEngine<wallets::Model> {
        wallets::Entity::find_by_id(wallet_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))
    }

    /// Persist a wallet balance computed by a ledger operation.
    ///
    /// This is the only balance write path. It accepts any value; negativity
    /// policy belongs to the ledger operations, not the store.
    pub(super) async fn persist_wallet_balance(
        &self,
        db_tx: &DatabaseTransaction,
        wallet_id: Uuid,
        new_balance_minor: i64,
    ) -> ResultEngine<()> {
        let active = wallets::ActiveModel {
            id: ActiveValue::Set(wallet_id.to_string()),
            balance_minor: ActiveValue::Set(new_balance_minor),
            ..Default::default()
        };
        active.update(db_tx).await?;
        Ok(())
    }

    async fn reject_duplicate_wallet_name(
        &self,
        db_tx: &DatabaseTransaction,
        name: &str,
        exclude: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = wallets::Entity::find()
            .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()));
        if let Some(wallet_id) = exclude {
            query = query.filter(wallets::Column::Id.ne(wallet_id.to_string()));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }
}
