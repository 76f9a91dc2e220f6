//! ops-runner: headless admin runner for the review-payout engine.
//!
//! Usage:
//!   ops-runner --seed 42 --db run.db
//!   ops-runner --ipc-mode            (JSON commands on stdin, one per line)

use anyhow::Result;
use reviewpay_core::{
    clock::OpsClock,
    config::OpsConfig,
    eligibility,
    event::FraudTrigger,
    identity, lifecycle, ops, reviews,
    reviews::NewReview,
    risk,
    rng::ScoreSeeder,
    seed::{self, DEMO_ADMIN_ID},
    store::PayoutStore,
    transactions,
};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::Path;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Dashboard,
    EligibleUsers,
    Evaluate {
        user_id: String,
        product_id: String,
        transaction_id: String,
    },
    SubmitReview {
        user_id: String,
        product_id: String,
        product_name: Option<String>,
        review_text: String,
        rating: i64,
        payout_amount: Option<f64>,
    },
    DetectFraud {
        review_id: i64,
    },
    Approve {
        review_id: i64,
    },
    Reject {
        review_id: i64,
        reason: Option<String>,
    },
    FlagFraud {
        review_id: i64,
        reason: Option<String>,
    },
    BulkApprove {
        review_ids: Vec<i64>,
    },
    RecordRefund {
        transaction_id: String,
        amount: Option<f64>,
    },
    FlagUser {
        user_id: String,
        reason: String,
    },
    UnflagUser {
        user_id: String,
    },
    AdvanceDays {
        days: u64,
    },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let config_path = args
        .windows(2)
        .find(|w| w[0] == "--config")
        .map(|w| w[1].as_str())
        .unwrap_or("ops-config.json");

    let mut config = OpsConfig::load_or_default(Path::new(config_path))?;
    if let Some(seed) = args
        .windows(2)
        .find(|w| w[0] == "--seed")
        .and_then(|w| w[1].parse().ok())
    {
        config.master_seed = seed;
    }

    let store = if db == ":memory:" {
        PayoutStore::in_memory()?
    } else {
        PayoutStore::open(db)?
    };
    store.migrate()?;

    let mut clock = match config.start_date {
        Some(date) => OpsClock::starting(date),
        None => OpsClock::system(),
    };
    let mut seeder = ScoreSeeder::new(config.master_seed);

    seed::seed_demo(&store, &clock)?;

    if !ipc_mode {
        println!("ops-runner — review-payout admin desk");
        println!("  seed: {}", config.master_seed);
        println!("  db:   {db}");
        println!();
        return run_demo(&store, &clock, &mut seeder, &config);
    }

    run_ipc_loop(&store, &mut clock, &mut seeder, &config)
}

fn run_ipc_loop(
    store: &PayoutStore,
    clock: &mut OpsClock,
    seeder: &mut ScoreSeeder,
    config: &OpsConfig,
) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{err_json}")?;
                stdout.flush()?;
                continue;
            }
        };

        if matches!(cmd, IpcCommand::Quit) {
            break;
        }
        match handle_command(store, clock, seeder, config, cmd) {
            Ok(value) => writeln!(stdout, "{value}")?,
            Err(e) => writeln!(
                stdout,
                "{}",
                serde_json::json!({ "success": false, "error": e.to_string() })
            )?,
        }
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(
    store: &PayoutStore,
    clock: &mut OpsClock,
    seeder: &mut ScoreSeeder,
    config: &OpsConfig,
    cmd: IpcCommand,
) -> Result<serde_json::Value> {
    let value = match cmd {
        IpcCommand::Dashboard => serde_json::to_value(ops::dashboard(store)?)?,
        IpcCommand::EligibleUsers => serde_json::to_value(ops::eligible_users(store, clock)?)?,
        IpcCommand::Evaluate {
            user_id,
            product_id,
            transaction_id,
        } => serde_json::to_value(eligibility::evaluate(
            store,
            clock,
            &user_id,
            &product_id,
            &transaction_id,
        )?)?,
        IpcCommand::SubmitReview {
            user_id,
            product_id,
            product_name,
            review_text,
            rating,
            payout_amount,
        } => serde_json::to_value(reviews::create_review(
            store,
            clock,
            seeder,
            config,
            NewReview {
                user_id,
                product_id,
                product_name,
                review_text,
                rating,
                payout_amount,
            },
        )?)?,
        IpcCommand::DetectFraud { review_id } => {
            serde_json::to_value(risk::assess_review(store, review_id)?)?
        }
        IpcCommand::Approve { review_id } => {
            serde_json::to_value(lifecycle::approve(store, clock, review_id, DEMO_ADMIN_ID)?)?
        }
        IpcCommand::Reject { review_id, reason } => serde_json::to_value(lifecycle::reject(
            store,
            clock,
            review_id,
            reason.as_deref(),
        )?)?,
        IpcCommand::FlagFraud { review_id, reason } => serde_json::to_value(
            lifecycle::flag_fraud(store, clock, review_id, reason.as_deref(), FraudTrigger::Admin)?,
        )?,
        IpcCommand::BulkApprove { review_ids } => serde_json::to_value(lifecycle::bulk_approve(
            store,
            clock,
            &review_ids,
            DEMO_ADMIN_ID,
        ))?,
        IpcCommand::RecordRefund {
            transaction_id,
            amount,
        } => serde_json::to_value(transactions::record_refund(
            store,
            clock,
            &transaction_id,
            amount,
        )?)?,
        IpcCommand::FlagUser { user_id, reason } => {
            serde_json::to_value(identity::flag_user(store, clock, &user_id, &reason)?)?
        }
        IpcCommand::UnflagUser { user_id } => {
            serde_json::to_value(identity::unflag_user(store, clock, &user_id)?)?
        }
        IpcCommand::AdvanceDays { days } => {
            clock.advance_days(days);
            serde_json::json!({ "today": clock.today() })
        }
        IpcCommand::Quit => unreachable!("handled by the loop"),
    };
    Ok(value)
}

/// Scripted walkthrough over the demo data: evaluate a few triples,
/// trip the refund auto-flag, and print the dashboard.
fn run_demo(
    store: &PayoutStore,
    clock: &OpsClock,
    seeder: &mut ScoreSeeder,
    config: &OpsConfig,
) -> Result<()> {
    let checks = [
        ("user1", "product1", "txn1001"),
        ("user1", "product2", "txn1002"),
        ("user2", "product3", "txn1004"),
        ("user3", "product1", "txn1005"),
    ];
    println!("=== ELIGIBILITY CHECKS ===");
    for (user, product, txn) in checks {
        let decision = eligibility::evaluate(store, clock, user, product, txn)?;
        println!(
            "  {user}/{product}/{txn}: {} — {}",
            decision.status, decision.message
        );
    }

    // user3 already has one fraud review after the refunded check above;
    // a short review on their other refunded purchase stacks every signal.
    let review = reviews::create_review(
        store,
        clock,
        seeder,
        config,
        NewReview {
            user_id: "user3".to_string(),
            product_id: "product4".to_string(),
            product_name: None,
            review_text: "Nice.".to_string(),
            rating: 5,
            payout_amount: None,
        },
    )?;
    let assessment = risk::assess_review(store, review.review_id)?;
    println!();
    println!("=== FRAUD ASSESSMENT (review {}) ===", review.review_id);
    println!("  score:          {:.2}", assessment.fraud_score);
    println!("  risk level:     {:?}", assessment.risk_level);
    println!("  recommendation: {:?}", assessment.recommendation);
    for factor in &assessment.fraud_factors {
        println!("    - {factor}");
    }

    let dashboard = ops::dashboard(store)?;
    println!();
    println!("=== DASHBOARD ===");
    println!("  flagged reviews:   {}", dashboard.summary.flagged_reviews);
    println!("  high-risk pending: {}", dashboard.summary.high_risk_pending);
    println!("  suspicious users:  {}", dashboard.summary.suspicious_users);
    println!("  total users:       {}", dashboard.summary.total_users);
    println!("  refund rate:       {:.2}%", dashboard.summary.refund_rate);

    println!();
    println!("=== RISK RANKING ===");
    for eligible in ops::eligible_users(store, clock)? {
        println!(
            "  {} — score {:.2} ({:?}), pending ${:.2}",
            eligible.user.user_id,
            eligible.risk_score,
            eligible.risk_level,
            eligible.total_pending_amount
        );
    }
    Ok(())
}
