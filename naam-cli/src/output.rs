//! Text and JSON rendering for command results

use libnaam::api::ActionOutcome;
use libnaam::service::dashboard::Dashboard;
use libnaam::service::market::PriceStats;
use libnaam::service::payments::PaymentSummary;
use libnaam::session::SessionInfo;
use libnaam::types::{
    BankDetails, CollectionEntry, FarmerSummary, LandDetails, Location, NewsItem, Payment, Poll,
    PricePoint, UserProfile,
};
use libnaam::ApiResult;
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn parse(s: &str) -> Self {
        if s == "json" {
            Format::Json
        } else {
            Format::Text
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn money(amount: f64) -> String {
    format!("Rs {:.2}", amount)
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

/// Keep the last four digits of an account number
pub fn mask_account(number: &str) -> String {
    let visible = number.len().saturating_sub(4);
    format!("{}{}", "X".repeat(visible), &number[visible..])
}

pub fn session(info: &SessionInfo) {
    println!("User:   {}", info.user_id);
    println!("Role:   {}", info.user_role);
    println!("Name:   {}", or_dash(info.user_data.name.as_deref()));
    println!("Mobile: {}", or_dash(info.user_data.mobile.as_deref()));
}

pub fn profile(profile: &UserProfile, completion: u8) {
    let rows = [
        ("Name", profile.name.as_deref()),
        ("Mobile", profile.mobile.as_deref()),
        ("Email", profile.email.as_deref()),
        ("Gender", profile.gender.as_deref()),
        ("Date of birth", profile.date_of_birth.as_deref()),
        ("Address", profile.address.as_deref()),
        ("Village", profile.village.as_deref()),
        ("Pincode", profile.pincode.as_deref()),
    ];
    for (label, value) in rows {
        println!("{:<14} {}", format!("{}:", label), or_dash(value));
    }
    let verified = |flag: Option<bool>| if flag == Some(true) { "verified" } else { "not verified" };
    println!("{:<14} {}", "Aadhaar:", verified(profile.aadhaar_verified));
    println!("{:<14} {}", "PAN:", verified(profile.pan_verified));
    println!("{:<14} {}%", "Complete:", completion);
}

pub fn completion(percent: u8, missing: &[&str]) {
    println!("Profile {}% complete", percent);
    if !missing.is_empty() {
        println!("Missing: {}", missing.join(", "));
    }
}

pub fn lands(lands: &[LandDetails]) {
    if lands.is_empty() {
        println!("No land registered");
        return;
    }
    for land in lands {
        let area = land
            .land_area
            .map(|a| format!("{} acres", a))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  survey {}  {}  {}",
            or_dash(land.id.as_deref()),
            or_dash(land.survey_number.as_deref()),
            area,
            or_dash(land.ownership_type.as_deref())
        );
        if land.coconut_farming {
            println!(
                "    coconut: {} trees, {} ({})",
                land.number_of_trees
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "?".to_string()),
                or_dash(land.coconut_variety.as_deref()),
                or_dash(land.harvest_frequency.as_deref())
            );
        }
    }
}

pub fn bank(details: &BankDetails) {
    let account = details.account_number.as_deref().map(mask_account);
    println!("Holder:  {}", or_dash(details.account_holder_name.as_deref()));
    println!("Account: {}", or_dash(account.as_deref()));
    println!("IFSC:    {}", or_dash(details.ifsc_code.as_deref()));
    println!("Bank:    {}", or_dash(details.bank_name.as_deref()));
    println!("Branch:  {}", or_dash(details.branch_name.as_deref()));
}

pub fn locations(items: &[Location]) {
    for location in items {
        println!("{:>8}  {}", location.id, location.name);
    }
}

pub fn collections(entries: &[CollectionEntry], summary: &PaymentSummary) {
    for entry in entries {
        let date = entry
            .collected_on
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {}  {:>6} nuts  {:>14}  {}",
            entry.id,
            date,
            entry.quantity.unwrap_or(0),
            money(entry.amount),
            entry.status
        );
    }
    println!();
    println!(
        "Pending: {} ({})   Paid: {} ({})",
        summary.pending_count,
        money(summary.pending_amount),
        summary.paid_count,
        money(summary.paid_amount)
    );
}

pub fn collection(entry: &CollectionEntry) {
    println!("Collection {}", entry.id);
    println!("  Farmer:   {}", or_dash(entry.farmer_name.as_deref().or(entry.farmer_id.as_deref())));
    if let Some(date) = entry.collected_on {
        println!("  Date:     {}", date);
    }
    if let Some(quantity) = entry.quantity {
        println!("  Quantity: {} nuts", quantity);
    }
    if let Some(weight) = entry.weight_kg {
        println!("  Weight:   {} kg", weight);
    }
    if let Some(rate) = entry.rate {
        println!("  Rate:     {} per nut", money(rate));
    }
    println!("  Amount:   {}", money(entry.amount));
    println!("  Status:   {}", entry.status);
}

pub fn payments(payments: &[Payment]) {
    if payments.is_empty() {
        println!("No payments yet");
        return;
    }
    for payment in payments {
        let mode = payment
            .mode
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string());
        let date = payment
            .paid_on
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {}  {:>14}  {:<4}  {}  {}",
            payment.id,
            date,
            money(payment.amount),
            mode,
            payment.status,
            or_dash(payment.reference.as_deref())
        );
    }
}

pub fn farmers(farmers: &[FarmerSummary]) {
    for farmer in farmers {
        println!(
            "{:<8} {:<24} {}",
            farmer.id,
            or_dash(farmer.name.as_deref()),
            or_dash(farmer.village.as_deref())
        );
    }
}

pub fn prices(commodity: &str, points: &[PricePoint], stats: Option<&PriceStats>) {
    let Some(stats) = stats else {
        println!("No {} prices in this window", commodity);
        return;
    };
    for point in points {
        println!(
            "{}  {:>10}  (min {}, max {})",
            point.date,
            money(point.modal_price),
            money(point.min_price),
            money(point.max_price)
        );
    }
    println!();
    let percent = stats
        .change_percent
        .map(|p| format!(" ({:+.1}%)", p))
        .unwrap_or_default();
    println!(
        "Latest {}  low {}  high {}  average {}  change {:+.2}{}",
        money(stats.latest),
        money(stats.min),
        money(stats.max),
        money(stats.average),
        stats.change,
        percent
    );
}

pub fn news(items: &[NewsItem]) {
    if items.is_empty() {
        println!("No news");
        return;
    }
    for item in items {
        println!("* {}", item.title);
        if let Some(date) = &item.published_at {
            println!("  {}", date);
        }
        println!(
            "  {} likes, {} shares, {} views",
            item.engagement.likes, item.engagement.shares, item.engagement.views
        );
    }
}

pub fn polls(polls: &[Poll]) {
    if polls.is_empty() {
        println!("No active polls");
        return;
    }
    for poll in polls {
        let voted = if poll.has_voted { " (voted)" } else { "" };
        println!("[{}] {}{}", poll.id, poll.question, voted);
        let total = poll.total_votes();
        for option in &poll.options {
            let share = if total == 0 {
                0
            } else {
                option.votes * 100 / total
            };
            println!("    {:>6}  {:<30} {:>3}%", option.id, option.label, share);
        }
    }
}

pub fn outcome(outcome: &ActionOutcome, fallback: &str) {
    println!("{}", outcome.message.as_deref().unwrap_or(fallback));
}

fn panel_json<T: Serialize>(result: &ApiResult<T>) -> Value {
    match result {
        ApiResult::Success(value) => json!({ "ok": value }),
        ApiResult::Failure(e) => json!({ "error": e.user_message() }),
    }
}

pub fn dashboard_json(dashboard: &Dashboard) -> Value {
    json!({
        "profile": panel_json(&dashboard.profile),
        "news": panel_json(&dashboard.news),
        "polls": panel_json(&dashboard.polls),
        "quote": panel_json(&dashboard.quote),
        "prices": panel_json(&dashboard.prices),
        "priceStats": dashboard.price_stats(),
    })
}

pub fn dashboard(dashboard: &Dashboard) {
    match &dashboard.profile {
        ApiResult::Success(p) => println!("Welcome, {}", or_dash(p.name.as_deref())),
        ApiResult::Failure(e) => println!("Profile unavailable: {}", e.user_message()),
    }

    println!();
    match &dashboard.quote {
        ApiResult::Success(q) => match &q.author {
            Some(author) => println!("\"{}\" - {}", q.text, author),
            None => println!("\"{}\"", q.text),
        },
        ApiResult::Failure(e) => println!("Quote unavailable: {}", e.user_message()),
    }

    println!();
    match dashboard.price_stats() {
        Some(stats) => println!(
            "Coconut: {} (low {}, high {})",
            money(stats.latest),
            money(stats.min),
            money(stats.max)
        ),
        None => match &dashboard.prices {
            ApiResult::Failure(e) => println!("Prices unavailable: {}", e.user_message()),
            ApiResult::Success(_) => println!("No recent prices"),
        },
    }

    println!();
    match &dashboard.news {
        ApiResult::Success(items) => {
            for item in items.iter().take(5) {
                println!("* {}", item.title);
            }
        }
        ApiResult::Failure(e) => println!("News unavailable: {}", e.user_message()),
    }

    match &dashboard.polls {
        ApiResult::Success(polls) if !polls.is_empty() => {
            println!();
            println!("{} active poll(s); run `naam polls list`", polls.len());
        }
        ApiResult::Success(_) => {}
        ApiResult::Failure(e) => println!("Polls unavailable: {}", e.user_message()),
    }
}
