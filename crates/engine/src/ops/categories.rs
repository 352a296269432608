use chrono::Utc;
use uuid::Uuid;

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{
    Category, EngineError, EntryKind, ResultEngine,
    categories::{self, DEFAULT_CATEGORIES},
    transactions,
    util::name_key,
};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Add a new category.
    ///
    /// Idempotent on the normalized `(name, kind)` pair: when a matching
    /// category already exists its id is returned and nothing is inserted.
    pub async fn new_category(&self, name: &str, kind: EntryKind) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            self.insert_category_if_missing(&db_tx, &name, kind)
                .await
                .map(|(id, _)| id)
        })
    }

    /// List categories, most recently created first, optionally filtered by
    /// kind.
    pub async fn list_categories(&self, kind: Option<EntryKind>) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            let mut query = categories::Entity::find()
                .order_by_desc(categories::Column::CreatedAt)
                .order_by_desc(categories::Column::Id);
            if let Some(kind) = kind {
                query = query.filter(categories::Column::Kind.eq(kind.as_str()));
            }
            let models = query.all(&db_tx).await?;
            models.into_iter().map(Category::try_from).collect()
        })
    }

    /// Rename and/or re-kind an existing category.
    pub async fn update_category(
        &self,
        category_id: Uuid,
        name: &str,
        kind: EntryKind,
    ) -> ResultEngine<()> {
        let name = normalize_required_name(name, "category")?;
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, category_id).await?;

            let key = name_key(&name);
            let clash = categories::Entity::find()
                .filter(categories::Column::NameKey.eq(key.clone()))
                .filter(categories::Column::Kind.eq(kind.as_str()))
                .filter(categories::Column::Id.ne(category_id.to_string()))
                .one(&db_tx)
                .await?;
            if clash.is_some() {
                return Err(EngineError::ExistingKey(name));
            }

            let active = categories::ActiveModel {
                id: ActiveValue::Set(category_id.to_string()),
                name: ActiveValue::Set(name),
                name_key: ActiveValue::Set(key),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                ..Default::default()
            };
            active.update(&db_tx).await?;
            Ok(())
        })
    }

    /// Deletes a category, detaching any transactions that reference it.
    ///
    /// Detaching (rather than cascading) keeps the transaction history and
    /// the wallet balances it backs untouched.
    pub async fn delete_category(&self, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, category_id).await?;

            transactions::Entity::update_many()
                .col_expr(
                    transactions::Column::CategoryId,
                    Expr::value(Value::String(None)),
                )
                .filter(transactions::Column::CategoryId.eq(category_id.to_string()))
                .exec(&db_tx)
                .await?;

            categories::Entity::delete_by_id(category_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Installs the default category set.
    ///
    /// Safe to run on every startup: existing `(name, kind)` pairs are
    /// skipped. Returns the number of categories inserted.
    pub async fn ensure_default_categories(&self) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            let mut inserted = 0;
            for (name, kind) in DEFAULT_CATEGORIES {
                let (_, was_inserted) =
                    self.insert_category_if_missing(&db_tx, name, *kind).await?;
                if was_inserted {
                    inserted += 1;
                }
            }
            if inserted > 0 {
                tracing::info!(inserted, "seeded default categories");
            }
            Ok(inserted)
        })
    }

    pub(super) async fn require_category(
        &self,
        db_tx: &DatabaseTransaction,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))
    }

    /// Require a category and check its kind against the transaction kind.
    pub(super) async fn require_category_of_kind(
        &self,
        db_tx: &DatabaseTransaction,
        category_id: Uuid,
        kind: EntryKind,
    ) -> ResultEngine<()> {
        let model = self.require_category(db_tx, category_id).await?;
        if model.kind != kind.as_str() {
            return Err(EngineError::InvalidName(format!(
                "category '{}' is {}, transaction is {}",
                model.name,
                model.kind,
                kind.as_str()
            )));
        }
        Ok(())
    }

    async fn insert_category_if_missing(
        &self,
        db_tx: &DatabaseTransaction,
        name: &str,
        kind: EntryKind,
    ) -> ResultEngine<(Uuid, bool)> {
        let key = name_key(name);
        if let Some(existing) = categories::Entity::find()
            .filter(categories::Column::NameKey.eq(key.clone()))
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .one(db_tx)
            .await?
        {
            return Ok((crate::util::parse_uuid(&existing.id, "category")?, false));
        }

        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            kind,
            created_at: Utc::now(),
        };
        category.to_active_model(key).insert(db_tx).await?;
        Ok((category.id, true))
    }
}
