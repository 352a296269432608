use chrono::{DateTime, NaiveDate, Utc};
use engine::{
    AddTransactionCmd, DateRange, Engine, EngineError, EntryKind, TransactionListFilter,
    TransactionSnapshot, UpdateTransactionCmd,
};
use migration::MigratorTrait;
use sea_orm::Database;
use uuid::Uuid;

async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build()
}

fn on(date: &str) -> DateTime<Utc> {
    format!("{date}T12:00:00Z").parse().unwrap()
}

async fn balance_of(engine: &Engine, wallet_id: Uuid) -> i64 {
    engine.wallet(wallet_id).await.unwrap().balance_minor
}

#[tokio::test]
async fn add_income_and_expense_updates_balance() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 10_000).await.unwrap();

    engine
        .add_transaction(AddTransactionCmd::new(
            "Salary",
            50_000,
            EntryKind::Income,
            wallet_id,
            on("2026-08-01"),
        ))
        .await
        .unwrap();
    engine
        .add_transaction(AddTransactionCmd::new(
            "Groceries",
            7_500,
            EntryKind::Expense,
            wallet_id,
            on("2026-08-02"),
        ))
        .await
        .unwrap();

    assert_eq!(balance_of(&engine, wallet_id).await, 10_000 + 50_000 - 7_500);
}

#[tokio::test]
async fn expense_may_drive_wallet_negative() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 1_000).await.unwrap();

    engine
        .add_transaction(AddTransactionCmd::new(
            "Repair",
            5_000,
            EntryKind::Expense,
            wallet_id,
            on("2026-08-01"),
        ))
        .await
        .unwrap();

    assert_eq!(balance_of(&engine, wallet_id).await, -4_000);
}

#[tokio::test]
async fn add_then_delete_restores_balance() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 2_000).await.unwrap();

    let tx_id = engine
        .add_transaction(AddTransactionCmd::new(
            "Coffee",
            300,
            EntryKind::Expense,
            wallet_id,
            on("2026-08-01"),
        ))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, wallet_id).await, 1_700);

    engine.delete_transaction(tx_id).await.unwrap();
    assert_eq!(balance_of(&engine, wallet_id).await, 2_000);

    let err = engine.delete_transaction(tx_id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::KeyNotFound("transaction not exists".to_string())
    );
}

#[tokio::test]
async fn identical_update_is_a_no_op_on_balance() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 10_000).await.unwrap();

    let tx_id = engine
        .add_transaction(AddTransactionCmd::new(
            "Lunch",
            1_500,
            EntryKind::Expense,
            wallet_id,
            on("2026-08-01"),
        ))
        .await
        .unwrap();

    let (tx, _) = engine.transaction_with_category(tx_id).await.unwrap();
    engine
        .update_transaction(UpdateTransactionCmd::new(
            tx_id,
            TransactionSnapshot::from(&tx),
            tx.name.clone(),
            tx.amount_minor,
            tx.kind,
            tx.wallet_id,
            tx.occurred_at,
        ))
        .await
        .unwrap();

    assert_eq!(balance_of(&engine, wallet_id).await, 8_500);
}

#[tokio::test]
async fn editing_amount_rebalances_same_wallet() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 10_000).await.unwrap();

    let tx_id = engine
        .add_transaction(AddTransactionCmd::new(
            "Dinner",
            5_000,
            EntryKind::Expense,
            wallet_id,
            on("2026-08-01"),
        ))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, wallet_id).await, 5_000);

    let (tx, _) = engine.transaction_with_category(tx_id).await.unwrap();
    engine
        .update_transaction(UpdateTransactionCmd::new(
            tx_id,
            TransactionSnapshot::from(&tx),
            "Dinner",
            3_000,
            EntryKind::Expense,
            wallet_id,
            tx.occurred_at,
        ))
        .await
        .unwrap();

    assert_eq!(balance_of(&engine, wallet_id).await, 7_000);
}

#[tokio::test]
async fn same_wallet_update_rejected_when_candidate_negative() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 0).await.unwrap();

    let tx_id = engine
        .add_transaction(AddTransactionCmd::new(
            "Refund",
            2_000,
            EntryKind::Income,
            wallet_id,
            on("2026-08-01"),
        ))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, wallet_id).await, 2_000);

    // Flipping the income into an expense would land at -4000.
    let (tx, _) = engine.transaction_with_category(tx_id).await.unwrap();
    let err = engine
        .update_transaction(UpdateTransactionCmd::new(
            tx_id,
            TransactionSnapshot::from(&tx),
            "Refund",
            2_000,
            EntryKind::Expense,
            wallet_id,
            tx.occurred_at,
        ))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InsufficientFunds("Cash".to_string()));

    assert_eq!(balance_of(&engine, wallet_id).await, 2_000);
    let (unchanged, _) = engine.transaction_with_category(tx_id).await.unwrap();
    assert_eq!(unchanged.kind, EntryKind::Income);
}

#[tokio::test]
async fn moving_transaction_rebalances_both_wallets() {
    let engine = engine_with_db().await;
    let cash_id = engine.new_wallet("Cash", 10_000).await.unwrap();
    let bank_id = engine.new_wallet("Bank", 10_000).await.unwrap();

    let tx_id = engine
        .add_transaction(AddTransactionCmd::new(
            "Groceries",
            4_000,
            EntryKind::Expense,
            cash_id,
            on("2026-08-01"),
        ))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, cash_id).await, 6_000);

    let (tx, _) = engine.transaction_with_category(tx_id).await.unwrap();
    engine
        .update_transaction(UpdateTransactionCmd::new(
            tx_id,
            TransactionSnapshot::from(&tx),
            "Groceries",
            4_000,
            EntryKind::Expense,
            bank_id,
            tx.occurred_at,
        ))
        .await
        .unwrap();

    assert_eq!(balance_of(&engine, cash_id).await, 10_000);
    assert_eq!(balance_of(&engine, bank_id).await, 6_000);
    let (moved, _) = engine.transaction_with_category(tx_id).await.unwrap();
    assert_eq!(moved.wallet_id, bank_id);
}

#[tokio::test]
async fn cross_wallet_move_fails_atomically_at_destination() {
    let engine = engine_with_db().await;
    let cash_id = engine.new_wallet("Cash", 10_000).await.unwrap();
    let bank_id = engine.new_wallet("Bank", 1_000).await.unwrap();

    let tx_id = engine
        .add_transaction(AddTransactionCmd::new(
            "Rent",
            5_000,
            EntryKind::Expense,
            cash_id,
            on("2026-08-01"),
        ))
        .await
        .unwrap();

    let (tx, _) = engine.transaction_with_category(tx_id).await.unwrap();
    let err = engine
        .update_transaction(UpdateTransactionCmd::new(
            tx_id,
            TransactionSnapshot::from(&tx),
            "Rent",
            5_000,
            EntryKind::Expense,
            bank_id,
            tx.occurred_at,
        ))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InsufficientFunds("Bank".to_string()));

    // Neither the source reversal nor the record change survives.
    assert_eq!(balance_of(&engine, cash_id).await, 5_000);
    assert_eq!(balance_of(&engine, bank_id).await, 1_000);
    let (unchanged, _) = engine.transaction_with_category(tx_id).await.unwrap();
    assert_eq!(unchanged.wallet_id, cash_id);
}

#[tokio::test]
async fn cross_wallet_move_fails_when_source_reversal_goes_negative() {
    let engine = engine_with_db().await;
    let cash_id = engine.new_wallet("Cash", 0).await.unwrap();
    let bank_id = engine.new_wallet("Bank", 0).await.unwrap();

    let income_id = engine
        .add_transaction(AddTransactionCmd::new(
            "Salary",
            10_000,
            EntryKind::Income,
            cash_id,
            on("2026-08-01"),
        ))
        .await
        .unwrap();
    engine
        .add_transaction(AddTransactionCmd::new(
            "Shopping",
            8_000,
            EntryKind::Expense,
            cash_id,
            on("2026-08-02"),
        ))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, cash_id).await, 2_000);

    // Reversing the salary on Cash would land at -8000.
    let (tx, _) = engine.transaction_with_category(income_id).await.unwrap();
    let err = engine
        .update_transaction(UpdateTransactionCmd::new(
            income_id,
            TransactionSnapshot::from(&tx),
            "Salary",
            10_000,
            EntryKind::Income,
            bank_id,
            tx.occurred_at,
        ))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::InsufficientFunds("Cash".to_string()));

    assert_eq!(balance_of(&engine, cash_id).await, 2_000);
    assert_eq!(balance_of(&engine, bank_id).await, 0);
}

#[tokio::test]
async fn deleting_income_down_to_zero_is_allowed() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 0).await.unwrap();

    let tx_id = engine
        .add_transaction(AddTransactionCmd::new(
            "Gift",
            2_500,
            EntryKind::Income,
            wallet_id,
            on("2026-08-01"),
        ))
        .await
        .unwrap();

    engine.delete_transaction(tx_id).await.unwrap();
    assert_eq!(balance_of(&engine, wallet_id).await, 0);
}

#[tokio::test]
async fn deleting_spent_income_is_rejected_without_mutation() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 0).await.unwrap();

    let income_id = engine
        .add_transaction(AddTransactionCmd::new(
            "Salary",
            10_000,
            EntryKind::Income,
            wallet_id,
            on("2026-08-01"),
        ))
        .await
        .unwrap();
    engine
        .add_transaction(AddTransactionCmd::new(
            "Shopping",
            9_000,
            EntryKind::Expense,
            wallet_id,
            on("2026-08-02"),
        ))
        .await
        .unwrap();

    let err = engine.delete_transaction(income_id).await.unwrap_err();
    assert_eq!(err, EngineError::InsufficientFunds("Cash".to_string()));

    assert_eq!(balance_of(&engine, wallet_id).await, 1_000);
    assert!(engine.transaction_with_category(income_id).await.is_ok());
}

#[tokio::test]
async fn deleting_expense_always_proceeds() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 0).await.unwrap();

    let tx_id = engine
        .add_transaction(AddTransactionCmd::new(
            "Repair",
            3_000,
            EntryKind::Expense,
            wallet_id,
            on("2026-08-01"),
        ))
        .await
        .unwrap();
    assert_eq!(balance_of(&engine, wallet_id).await, -3_000);

    engine.delete_transaction(tx_id).await.unwrap();
    assert_eq!(balance_of(&engine, wallet_id).await, 0);
}

#[tokio::test]
async fn wallet_names_are_unique_case_insensitive() {
    let engine = engine_with_db().await;
    engine.new_wallet("Cash", 0).await.unwrap();

    let err = engine.new_wallet("cash", 0).await.unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("cash".to_string()));

    let bank_id = engine.new_wallet("Bank", 0).await.unwrap();
    let err = engine.rename_wallet(bank_id, "CASH").await.unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("CASH".to_string()));
}

#[tokio::test]
async fn wallet_delete_refused_while_transactions_reference_it() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 0).await.unwrap();

    let tx_id = engine
        .add_transaction(AddTransactionCmd::new(
            "Coffee",
            300,
            EntryKind::Expense,
            wallet_id,
            on("2026-08-01"),
        ))
        .await
        .unwrap();

    let err = engine.delete_wallet(wallet_id).await.unwrap_err();
    assert_eq!(err, EngineError::WalletNotEmpty("Cash".to_string()));

    engine.delete_transaction(tx_id).await.unwrap();
    engine.delete_wallet(wallet_id).await.unwrap();
    assert!(engine.list_wallets().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_ids_are_reported() {
    let engine = engine_with_db().await;

    let err = engine.wallet(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("wallet not exists".to_string()));

    let err = engine
        .add_transaction(AddTransactionCmd::new(
            "Lunch",
            1_000,
            EntryKind::Expense,
            Uuid::new_v4(),
            on("2026-08-01"),
        ))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("wallet not exists".to_string()));
}

#[tokio::test]
async fn default_categories_seed_once() {
    let engine = engine_with_db().await;

    let first = engine.ensure_default_categories().await.unwrap();
    assert!(first > 0);

    let second = engine.ensure_default_categories().await.unwrap();
    assert_eq!(second, 0);

    // Re-adding a default under different casing reuses the existing row.
    let before = engine.list_categories(None).await.unwrap().len();
    engine
        .new_category("  salary ", EntryKind::Income)
        .await
        .unwrap();
    assert_eq!(engine.list_categories(None).await.unwrap().len(), before);
}

#[tokio::test]
async fn same_name_allowed_across_kinds() {
    let engine = engine_with_db().await;

    let income_id = engine.new_category("Other", EntryKind::Income).await.unwrap();
    let expense_id = engine
        .new_category("Other", EntryKind::Expense)
        .await
        .unwrap();
    assert_ne!(income_id, expense_id);
}

#[tokio::test]
async fn category_kind_must_match_transaction_kind() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 10_000).await.unwrap();
    let salary_id = engine.new_category("Salary", EntryKind::Income).await.unwrap();

    let err = engine
        .add_transaction(
            AddTransactionCmd::new(
                "Lunch",
                1_000,
                EntryKind::Expense,
                wallet_id,
                on("2026-08-01"),
            )
            .category_id(salary_id),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidName(_)));
    assert_eq!(balance_of(&engine, wallet_id).await, 10_000);
}

#[tokio::test]
async fn deleting_category_detaches_transactions() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 10_000).await.unwrap();
    let food_id = engine.new_category("Food", EntryKind::Expense).await.unwrap();

    let tx_id = engine
        .add_transaction(
            AddTransactionCmd::new(
                "Lunch",
                1_500,
                EntryKind::Expense,
                wallet_id,
                on("2026-08-01"),
            )
            .category_id(food_id),
        )
        .await
        .unwrap();

    engine.delete_category(food_id).await.unwrap();

    let (tx, category_name) = engine.transaction_with_category(tx_id).await.unwrap();
    assert_eq!(tx.category_id, None);
    assert_eq!(category_name, None);
    assert_eq!(balance_of(&engine, wallet_id).await, 8_500);
}

#[tokio::test]
async fn category_rename_rejects_existing_pair() {
    let engine = engine_with_db().await;
    let food_id = engine.new_category("Food", EntryKind::Expense).await.unwrap();
    engine
        .new_category("Transport", EntryKind::Expense)
        .await
        .unwrap();

    let err = engine
        .update_category(food_id, "transport", EntryKind::Expense)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("transport".to_string()));

    engine
        .update_category(food_id, "Food & Drink", EntryKind::Expense)
        .await
        .unwrap();
}

#[tokio::test]
async fn listing_filters_by_kind_and_limit() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 100_000).await.unwrap();

    for (name, amount, kind) in [
        ("Salary", 50_000, EntryKind::Income),
        ("Groceries", 4_000, EntryKind::Expense),
        ("Coffee", 300, EntryKind::Expense),
    ] {
        engine
            .add_transaction(AddTransactionCmd::new(
                name,
                amount,
                kind,
                wallet_id,
                on("2026-08-10"),
            ))
            .await
            .unwrap();
    }

    let all = engine
        .list_transactions(&TransactionListFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].name, "Coffee");
    assert_eq!(all[2].name, "Salary");

    let expenses = engine
        .list_transactions(&TransactionListFilter {
            kind: Some(EntryKind::Expense),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(expenses.len(), 2);

    let latest = engine
        .list_transactions(&TransactionListFilter {
            limit: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].name, "Coffee");
}

#[tokio::test]
async fn period_sums_use_half_open_ranges() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 0).await.unwrap();

    for (name, amount, kind, date) in [
        ("July salary", 40_000, EntryKind::Income, "2026-07-31"),
        ("August salary", 50_000, EntryKind::Income, "2026-08-01"),
        ("Groceries", 4_000, EntryKind::Expense, "2026-08-15"),
        ("September rent", 30_000, EntryKind::Expense, "2026-09-01"),
    ] {
        engine
            .add_transaction(AddTransactionCmd::new(name, amount, kind, wallet_id, on(date)))
            .await
            .unwrap();
    }

    let august = DateRange::month(2026, 8).unwrap();
    assert_eq!(
        engine
            .sum_for_range(EntryKind::Income, &august)
            .await
            .unwrap(),
        50_000
    );
    assert_eq!(
        engine
            .sum_for_range(EntryKind::Expense, &august)
            .await
            .unwrap(),
        4_000
    );

    let listed = engine
        .list_transactions(&TransactionListFilter {
            range: Some(august),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn category_totals_sorted_largest_first() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 100_000).await.unwrap();
    let food_id = engine.new_category("Food", EntryKind::Expense).await.unwrap();
    let transport_id = engine
        .new_category("Transport", EntryKind::Expense)
        .await
        .unwrap();

    for (name, amount, category) in [
        ("Lunch", 3_000, Some(food_id)),
        ("Dinner", 2_000, Some(food_id)),
        ("Bus", 1_000, Some(transport_id)),
        ("Misc", 500, None),
    ] {
        let mut cmd = AddTransactionCmd::new(
            name,
            amount,
            EntryKind::Expense,
            wallet_id,
            on("2026-08-10"),
        );
        if let Some(category_id) = category {
            cmd = cmd.category_id(category_id);
        }
        engine.add_transaction(cmd).await.unwrap();
    }

    let august = DateRange::month(2026, 8).unwrap();
    let totals = engine
        .category_totals(EntryKind::Expense, &august)
        .await
        .unwrap();

    assert_eq!(totals.len(), 3);
    assert_eq!(totals[0].category_name.as_deref(), Some("Food"));
    assert_eq!(totals[0].total_minor, 5_000);
    assert_eq!(totals[1].category_name.as_deref(), Some("Transport"));
    assert_eq!(totals[1].total_minor, 1_000);
    assert_eq!(totals[2].category_name, None);
    assert_eq!(totals[2].total_minor, 500);
}

#[tokio::test]
async fn weekly_series_buckets_by_weekday() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 100_000).await.unwrap();

    // 2026-08-24 is a Monday.
    for (name, amount, kind, date) in [
        ("Salary", 10_000, EntryKind::Income, "2026-08-25"),
        ("Lunch", 1_500, EntryKind::Expense, "2026-08-25"),
        ("Cinema", 2_000, EntryKind::Expense, "2026-08-30"),
        ("Outside", 9_999, EntryKind::Expense, "2026-08-31"),
    ] {
        engine
            .add_transaction(AddTransactionCmd::new(name, amount, kind, wallet_id, on(date)))
            .await
            .unwrap();
    }

    let week = DateRange::week_of(NaiveDate::from_ymd_opt(2026, 8, 26).unwrap());
    let buckets = engine.weekly_series(&week).await.unwrap();

    assert_eq!(buckets[1].income_minor, 10_000);
    assert_eq!(buckets[1].expense_minor, 1_500);
    assert_eq!(buckets[6].expense_minor, 2_000);
    assert_eq!(buckets[0].income_minor + buckets[0].expense_minor, 0);
}

#[tokio::test]
async fn monthly_series_buckets_by_month() {
    let engine = engine_with_db().await;
    let wallet_id = engine.new_wallet("Cash", 100_000).await.unwrap();

    for (name, amount, kind, date) in [
        ("January salary", 50_000, EntryKind::Income, "2026-01-15"),
        ("December gifts", 8_000, EntryKind::Expense, "2026-12-20"),
        ("Last year", 7_777, EntryKind::Expense, "2025-12-31"),
    ] {
        engine
            .add_transaction(AddTransactionCmd::new(name, amount, kind, wallet_id, on(date)))
            .await
            .unwrap();
    }

    let buckets = engine.monthly_series(2026).await.unwrap();
    assert_eq!(buckets[0].income_minor, 50_000);
    assert_eq!(buckets[11].expense_minor, 8_000);
    assert_eq!(buckets[10].expense_minor, 0);
}

#[tokio::test]
async fn total_balance_sums_all_wallets() {
    let engine = engine_with_db().await;
    assert_eq!(engine.total_balance().await.unwrap(), 0);

    engine.new_wallet("Cash", 1_000).await.unwrap();
    let bank_id = engine.new_wallet("Bank", 4_000).await.unwrap();
    engine
        .add_transaction(AddTransactionCmd::new(
            "Fees",
            500,
            EntryKind::Expense,
            bank_id,
            on("2026-08-01"),
        ))
        .await
        .unwrap();

    assert_eq!(engine.total_balance().await.unwrap(), 4_500);
}
