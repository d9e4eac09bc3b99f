use anyhow::{Context, Result};
use chrono::NaiveDate;

use super::util::{describe_day, describe_window, format_amount, truncate};
use crate::apply::Applier;
use crate::calendar;
use crate::clock::{Clock, FixedClock, SystemClock};
use crate::config::Config;
use crate::db::Database;
use crate::models::{Account, Category, EntryKind, RecurringTemplate};
use crate::sync::{SyncReport, Synchronizer};

const SYNC_ATTEMPTS: u32 = 3;

/// Everything a command needs besides the database.
pub(crate) struct Session<'a> {
    pub(crate) config: &'a Config,
    pub(crate) user_id: i64,
}

pub(crate) fn as_cli(args: &[String], db: &mut Database, session: &Session<'_>) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "templates" | "t" => cli_templates(db),
        "template-add" | "add" => cli_template_add(rest, db, session),
        "template-edit" | "edit" => cli_template_edit(rest, db, session),
        "template-delete" => cli_template_delete(rest, db),
        "sync" => cli_sync(rest, db, session),
        "occurrences" | "o" => cli_occurrences(rest, db),
        "upcoming" | "u" => cli_upcoming(rest, db),
        "apply" => cli_apply(rest, db, session),
        "cancel" => cli_cancel(rest, db),
        "ledger" | "l" => cli_ledger(rest, db),
        "export" => cli_export(rest, db),
        "accounts" => cli_accounts(db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("ledgerloop {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

pub(crate) fn print_usage() {
    println!("LedgerLoop: recurring income and expenses for a local ledger");
    println!();
    println!("Usage: ledgerloop <command>");
    println!();
    println!("Commands:");
    println!("  templates                     List recurring templates");
    println!("  template-add <title>          Create a template and schedule it");
    println!("    --amount <n>                Amount (required)");
    println!("    --day <1-31>                Day of month (default: 1)");
    println!("    --from <YYYY-MM>            First month (required)");
    println!("    --to <YYYY-MM>              Last month (default: open-ended)");
    println!("    --kind <income|expense>     Entry kind (default: expense)");
    println!("    --eom                       Land on the last day of short months");
    println!("    --account <name>            Account (default: first account)");
    println!("    --category <name>           Category (default: Uncategorized)");
    println!("    --memo <text>               Memo copied to ledger records");
    println!("  template-edit <id> [flags]    Change a template and re-schedule it");
    println!("    accepts the flags above plus --title, --to none, --fixed-day");
    println!("  template-delete <id>          Delete a template and its occurrences");
    println!("  sync [id]                     Re-synchronize one or all templates");
    println!("    --today <YYYY-MM-DD>        Pretend today is this date");
    println!("  occurrences <template-id>     List a template's occurrences");
    println!("  upcoming [months]             Scheduled occurrences through the end of the");
    println!("                                Nth month after this one (default: 1)");
    println!("  apply <occurrence-id>         Record an occurrence in the ledger");
    println!("  cancel <occurrence-id>        Cancel an occurrence, removing its record");
    println!("  ledger [YYYY-MM]              Incomes and expenses for a month");
    println!("  export <template-id> [path]   Export a template's schedule to CSV");
    println!("  accounts                      List all accounts");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
    println!();
    println!("Environment:");
    println!("  LEDGERLOOP_HORIZON_MONTHS     Rolling window for open-ended templates (default: 24)");
    println!("  LEDGERLOOP_DB                 Database path");
}

// ── Argument helpers ──────────────────────────────────────────

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|a| a == name)
}

/// First argument that is neither a flag nor a flag's value.
fn positional(args: &[String]) -> Option<&str> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg.starts_with("--") {
            skip_next = !matches!(arg.as_str(), "--eom" | "--fixed-day");
            continue;
        }
        return Some(arg.as_str());
    }
    None
}

fn parse_id(args: &[String], what: &str) -> Result<i64> {
    let raw = positional(args).ok_or_else(|| anyhow::anyhow!("Missing {what}"))?;
    raw.parse::<i64>()
        .with_context(|| format!("Invalid {what}: {raw}"))
}

fn parse_month_flag(args: &[String], name: &str) -> Result<Option<NaiveDate>> {
    match flag(args, name) {
        None => Ok(None),
        Some(raw) => calendar::parse_month(raw)
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("Invalid month for {name}: {raw} (use YYYY-MM)")),
    }
}

fn parse_number_flag<T: std::str::FromStr>(args: &[String], name: &str) -> Result<Option<T>> {
    match flag(args, name) {
        None => Ok(None),
        Some(raw) => raw
            .replace(',', "")
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("Invalid number for {name}: {raw}")),
    }
}

fn resolve_account(db: &Database, name: Option<&str>) -> Result<i64> {
    let accounts = db.get_accounts()?;
    let account = match name {
        Some(name) => Account::find_by_name(&accounts, name)
            .ok_or_else(|| anyhow::anyhow!("Account '{name}' not found"))?,
        None => accounts
            .first()
            .ok_or_else(|| anyhow::anyhow!("No accounts found"))?,
    };
    account
        .id
        .ok_or_else(|| anyhow::anyhow!("Account has no ID"))
}

/// Look up a category by name, creating it when it does not exist yet.
fn resolve_category(db: &Database, name: Option<&str>) -> Result<i64> {
    let name = name.unwrap_or("Uncategorized");
    let categories = db.get_categories()?;
    if let Some(id) = Category::find_by_name(&categories, name).and_then(|c| c.id) {
        return Ok(id);
    }
    let id = db.insert_category(&Category::new(name.to_string()))?;
    println!("Created category: {name}");
    Ok(id)
}

fn synchronizer<'a>(config: &Config, clock: &'a dyn Clock) -> Synchronizer<'a> {
    Synchronizer::new(config.horizon_months, clock)
}

fn print_report(id: i64, report: &SyncReport) {
    if report.writes() == 0 {
        println!("Template {id}: up to date");
    } else {
        println!(
            "Template {id}: {} created, {} moved, {} removed, {} canceled",
            report.created, report.updated, report.deleted, report.canceled
        );
    }
}

// ── Templates ─────────────────────────────────────────────────

fn cli_templates(db: &mut Database) -> Result<()> {
    let templates = db.get_templates()?;
    if templates.is_empty() {
        println!("No recurring templates");
        return Ok(());
    }
    let categories = db.get_categories()?;

    println!(
        "{:<4} {:<8} {:<24} {:>12} {:<14} {:<18} Window",
        "ID", "Kind", "Title", "Amount", "Day", "Category"
    );
    println!("{}", "─".repeat(96));
    for t in &templates {
        let category = Category::find_by_id(&categories, t.category_id)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        println!(
            "{:<4} {:<8} {:<24} {:>12} {:<14} {:<18} {}",
            t.id.unwrap_or(0),
            t.kind.as_str(),
            truncate(&t.title, 24),
            format_amount(t.amount),
            describe_day(t),
            truncate(category, 18),
            describe_window(t),
        );
    }
    Ok(())
}

fn cli_template_add(args: &[String], db: &mut Database, session: &Session<'_>) -> Result<()> {
    let title = positional(args)
        .ok_or_else(|| anyhow::anyhow!("Usage: ledgerloop template-add <title> --amount <n> --from <YYYY-MM>"))?;
    let amount: i64 = parse_number_flag(args, "--amount")?
        .ok_or_else(|| anyhow::anyhow!("--amount is required"))?;
    let from = parse_month_flag(args, "--from")?
        .ok_or_else(|| anyhow::anyhow!("--from is required"))?;
    let day: u32 = parse_number_flag(args, "--day")?.unwrap_or(1);
    let kind = match flag(args, "--kind") {
        Some(raw) => EntryKind::parse(raw)
            .ok_or_else(|| anyhow::anyhow!("Invalid kind: {raw} (use income or expense)"))?,
        None => EntryKind::Expense,
    };
    let account_id = resolve_account(db, flag(args, "--account"))?;
    let category_id = resolve_category(db, flag(args, "--category"))?;

    let mut template = RecurringTemplate::new(
        kind,
        account_id,
        category_id,
        title.to_string(),
        amount,
        day,
        from,
    );
    template.effective_to = parse_month_flag(args, "--to")?;
    template.use_end_of_month = has_flag(args, "--eom");
    if let Some(memo) = flag(args, "--memo") {
        template.memo = memo.to_string();
    }

    let clock = SystemClock;
    let (stored, report) = synchronizer(session.config, &clock).save_template(db, &template)?;
    println!(
        "Created template {} ({}), scheduled {} occurrence(s)",
        stored.id.unwrap_or(0),
        describe_window(&stored),
        report.created
    );
    Ok(())
}

fn cli_template_edit(args: &[String], db: &mut Database, session: &Session<'_>) -> Result<()> {
    let id = parse_id(args, "template id")?;
    let mut template = db
        .get_template(id)?
        .ok_or_else(|| anyhow::anyhow!("Template {id} not found"))?;

    if let Some(title) = flag(args, "--title") {
        template.title = title.to_string();
    }
    if let Some(amount) = parse_number_flag(args, "--amount")? {
        template.amount = amount;
    }
    if let Some(day) = parse_number_flag(args, "--day")? {
        template.day_of_month = day;
    }
    if let Some(from) = parse_month_flag(args, "--from")? {
        template.effective_from = Some(from);
    }
    match flag(args, "--to") {
        Some("none") | Some("open") => template.effective_to = None,
        Some(_) => template.effective_to = parse_month_flag(args, "--to")?,
        None => {}
    }
    if has_flag(args, "--eom") {
        template.use_end_of_month = true;
    }
    if has_flag(args, "--fixed-day") {
        template.use_end_of_month = false;
    }
    if let Some(memo) = flag(args, "--memo") {
        template.memo = memo.to_string();
    }
    if let Some(name) = flag(args, "--account") {
        template.account_id = resolve_account(db, Some(name))?;
    }
    if let Some(name) = flag(args, "--category") {
        template.category_id = resolve_category(db, Some(name))?;
    }

    let clock = SystemClock;
    let (stored, report) = synchronizer(session.config, &clock).save_template(db, &template)?;
    println!(
        "Updated template {} ({}): {} created, {} moved, {} removed, {} canceled",
        id,
        describe_window(&stored),
        report.created,
        report.updated,
        report.deleted,
        report.canceled
    );
    if report.canceled > 0 {
        println!("Note: ledger records of canceled occurrences were kept");
    }
    Ok(())
}

fn cli_template_delete(args: &[String], db: &mut Database) -> Result<()> {
    let id = parse_id(args, "template id")?;
    if db.delete_template(id)? {
        println!("Deleted template {id}");
    } else {
        println!("Template {id} not found");
    }
    Ok(())
}

fn cli_sync(args: &[String], db: &mut Database, session: &Session<'_>) -> Result<()> {
    let fixed = match flag(args, "--today") {
        Some(raw) => Some(FixedClock::on(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("Invalid date for --today: {raw}"))?,
        )),
        None => None,
    };
    let system = SystemClock;
    let clock: &dyn Clock = match &fixed {
        Some(c) => c,
        None => &system,
    };
    let sync = synchronizer(session.config, clock);

    if positional(args).is_some() {
        let id = parse_id(args, "template id")?;
        let template = db
            .get_template(id)?
            .ok_or_else(|| anyhow::anyhow!("Template {id} not found"))?;
        let report = sync.call_with_retry(db, &template, SYNC_ATTEMPTS)?;
        print_report(id, &report);
        return Ok(());
    }

    let results = sync.synchronize_all(db)?;
    if results.is_empty() {
        println!("No recurring templates");
        return Ok(());
    }
    let mut failures = 0;
    for (id, result) in &results {
        match result {
            Ok(report) => print_report(*id, report),
            Err(e) => {
                failures += 1;
                eprintln!("Template {id}: {e}");
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("{failures} template(s) failed to synchronize");
    }
    Ok(())
}

// ── Occurrences ───────────────────────────────────────────────

fn cli_occurrences(args: &[String], db: &mut Database) -> Result<()> {
    let id = parse_id(args, "template id")?;
    let template = db
        .get_template(id)?
        .ok_or_else(|| anyhow::anyhow!("Template {id} not found"))?;
    let occurrences = db.get_occurrences(id)?;

    println!(
        "{}: {} {} ({})",
        template.title,
        template.kind,
        format_amount(template.amount),
        describe_window(&template)
    );
    println!("{:<6} {:<8} {:<11} {:<10} Ledger", "ID", "Month", "Date", "Status");
    println!("{}", "─".repeat(50));
    for occ in &occurrences {
        let ledger = occ
            .ledger_ref
            .map(|r| format!("{} #{}", r.kind(), r.id()))
            .unwrap_or_default();
        println!(
            "{:<6} {:<8} {:<11} {:<10} {}",
            occ.id.unwrap_or(0),
            calendar::format_month(occ.period_month),
            occ.occurs_on,
            occ.status.as_str(),
            ledger
        );
    }
    Ok(())
}

fn cli_upcoming(args: &[String], db: &mut Database) -> Result<()> {
    let months: u32 = match positional(args) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid number of months: {raw}"))?,
        None => 1,
    };
    let today = SystemClock.today();
    let until = calendar::add_months(today, months.saturating_add(1))
        .pred_opt()
        .unwrap_or(today);
    let upcoming = db.get_upcoming(today, until)?;
    if upcoming.is_empty() {
        println!("Nothing scheduled until {until}");
        return Ok(());
    }

    let templates = db.get_templates()?;
    println!("{:<6} {:<11} {:<8} {:<24} {:>12}", "ID", "Date", "Kind", "Title", "Amount");
    println!("{}", "─".repeat(65));
    for occ in &upcoming {
        let Some(t) = templates.iter().find(|t| t.id == Some(occ.template_id)) else {
            continue;
        };
        println!(
            "{:<6} {:<11} {:<8} {:<24} {:>12}",
            occ.id.unwrap_or(0),
            occ.occurs_on,
            t.kind.as_str(),
            truncate(&t.title, 24),
            format_amount(t.amount)
        );
    }
    Ok(())
}

fn cli_apply(args: &[String], db: &mut Database, session: &Session<'_>) -> Result<()> {
    let id = parse_id(args, "occurrence id")?;
    let clock = SystemClock;
    let occ = Applier::new(&clock).apply(db, id, Some(session.user_id))?;
    let Some(r) = occ.ledger_ref else {
        println!("Occurrence {id} is {}", occ.status);
        return Ok(());
    };
    match db.get_ledger_entry(r)? {
        Some(entry) => println!(
            "Applied occurrence {id}: {} {} on {} ({} #{})",
            entry.title,
            format_amount(entry.signed_amount()),
            entry.date,
            r.kind(),
            r.id()
        ),
        None => println!("Applied occurrence {id} as {} #{}", r.kind(), r.id()),
    }
    Ok(())
}

fn cli_cancel(args: &[String], db: &mut Database) -> Result<()> {
    let id = parse_id(args, "occurrence id")?;
    let clock = SystemClock;
    let before = db.get_occurrence(id)?;
    Applier::new(&clock).cancel(db, id)?;
    match before.and_then(|o| o.ledger_ref) {
        Some(r) => println!("Canceled occurrence {id}; removed {} #{}", r.kind(), r.id()),
        None => println!("Canceled occurrence {id}"),
    }
    Ok(())
}

// ── Ledger ────────────────────────────────────────────────────

fn cli_ledger(args: &[String], db: &mut Database) -> Result<()> {
    let month = match positional(args) {
        Some(raw) => calendar::parse_month(raw)
            .ok_or_else(|| anyhow::anyhow!("Invalid month: {raw} (use YYYY-MM)"))?,
        None => calendar::month_start(SystemClock.today()),
    };
    let entries = db.get_ledger_entries(month)?;
    let label = calendar::format_month(month);
    if entries.is_empty() {
        println!("No ledger records for {label}");
        return Ok(());
    }

    println!("Ledger for {label}");
    println!("{}", "─".repeat(55));
    let mut net = 0i64;
    for entry in &entries {
        net += entry.signed_amount();
        println!(
            "  {:<11} {:<8} {:<20} {:>12}",
            entry.date,
            entry.kind.as_str(),
            truncate(&entry.title, 20),
            format_amount(entry.signed_amount())
        );
    }
    println!("{}", "─".repeat(55));
    println!("  {:<40} {:>12}", "Net", format_amount(net));
    Ok(())
}

fn cli_export(args: &[String], db: &mut Database) -> Result<()> {
    let id = parse_id(args, "template id")?;
    let template = db
        .get_template(id)?
        .ok_or_else(|| anyhow::anyhow!("Template {id} not found"))?;
    let occurrences = db.get_occurrences(id)?;

    let output_path = args
        .iter()
        .filter(|a| !a.starts_with('-'))
        .nth(1)
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| format!("ledgerloop-template-{id}.csv"));
    let file = std::fs::File::create(&output_path)
        .with_context(|| format!("Failed to create {output_path}"))?;
    let count = crate::export::write_schedule(file, &template, &occurrences)?;
    println!("Exported {count} occurrence(s) to {output_path}");
    Ok(())
}

fn cli_accounts(db: &mut Database) -> Result<()> {
    let accounts = db.get_accounts()?;
    if accounts.is_empty() {
        println!("No accounts");
        return Ok(());
    }

    println!("{:<4} {:<20} {:<15} Currency", "ID", "Name", "Type");
    println!("{}", "─".repeat(50));
    for acct in &accounts {
        println!(
            "{:<4} {:<20} {:<15} {}",
            acct.id.unwrap_or(0),
            acct.name,
            acct.account_type.as_str(),
            acct.currency,
        );
    }
    Ok(())
}

fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_flag_lookup() {
        let a = args(&["Rent", "--amount", "80000", "--eom", "--from", "2025-01"]);
        assert_eq!(flag(&a, "--amount"), Some("80000"));
        assert_eq!(flag(&a, "--to"), None);
        assert!(has_flag(&a, "--eom"));
        assert!(!has_flag(&a, "--fixed-day"));
    }

    #[test]
    fn test_positional_skips_flag_values() {
        let a = args(&["--amount", "5", "--eom", "Rent"]);
        assert_eq!(positional(&a), Some("Rent"));
        assert_eq!(positional(&args(&["--today", "2025-01-01"])), None);
    }

    #[test]
    fn test_parse_number_flag_allows_separators() {
        let a = args(&["--amount", "80,000"]);
        assert_eq!(parse_number_flag::<i64>(&a, "--amount").unwrap(), Some(80_000));
        let bad = args(&["--amount", "lots"]);
        assert!(parse_number_flag::<i64>(&bad, "--amount").is_err());
    }

    #[test]
    fn test_parse_month_flag() {
        let a = args(&["--from", "2025-03"]);
        assert_eq!(
            parse_month_flag(&a, "--from").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 1)
        );
        assert!(parse_month_flag(&args(&["--from", "03/2025"]), "--from").is_err());
    }

    #[test]
    fn test_shellexpand_plain_path() {
        assert_eq!(shellexpand("out.csv"), "out.csv");
    }
}
