use chrono::{DateTime, Duration, Utc};
use credit_core::CoreError;
use credit_domain::{Credits, Period, Player, PlayerId, RecurringPayment, TimelineEntry};
use serde::Serialize;

use crate::cli::{output, CliContext, CommandEntry, CommandRegistry, CommandResult};
use crate::TrackerError;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";
const SHORT_ID_LEN: usize = 8;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "players",
            "List players with balance and forecast",
            "players [--json]",
            cmd_players,
        ),
        CommandEntry::new(
            "add-player",
            "Register a player with opening credits",
            "add-player <name> <credits>",
            cmd_add_player,
        ),
        CommandEntry::new(
            "remove-player",
            "Remove a player, their entries and payments",
            "remove-player <player>",
            cmd_remove_player,
        ),
        CommandEntry::new("balance", "Show a player's balance", "balance <player>", cmd_balance),
        CommandEntry::new("total", "Show the sum of all balances", "total", cmd_total),
        CommandEntry::new(
            "forecast",
            "Days until a player runs out of credits",
            "forecast <player>",
            cmd_forecast,
        ),
        CommandEntry::new(
            "projection",
            "Projected daily balance",
            "projection <player> [days]",
            cmd_projection,
        ),
        CommandEntry::new(
            "history",
            "Recorded and scheduled movements of recent days",
            "history <player> [days]",
            cmd_history,
        ),
        CommandEntry::new(
            "credit",
            "Add (or with a negative amount, remove) credits",
            "credit <player> <amount>",
            cmd_credit,
        ),
        CommandEntry::new(
            "set",
            "Record whatever entry brings a balance to an amount",
            "set <player> <amount>",
            cmd_set,
        ),
        CommandEntry::new(
            "distribute",
            "Split whole credits across all players",
            "distribute <amount>",
            cmd_distribute,
        ),
        CommandEntry::new(
            "pay",
            "Schedule a recurring payment starting now",
            "pay <player> <name> <amount> <period>",
            cmd_pay,
        ),
        CommandEntry::new(
            "pay-all",
            "Split a recurring payment across all players",
            "pay-all <name> <amount> <period>",
            cmd_pay_all,
        ),
        CommandEntry::new(
            "payments",
            "List a player's active scheduled payments",
            "payments <player>",
            cmd_payments,
        ),
        CommandEntry::new(
            "end-payment",
            "Stop a scheduled payment, keeping its past occurrences",
            "end-payment <id>",
            cmd_end_payment,
        ),
        CommandEntry::new(
            "remove-payment",
            "Delete a scheduled payment entirely",
            "remove-payment <id>",
            cmd_remove_payment,
        ),
        CommandEntry::new("time", "Show the simulation clock", "time", cmd_time),
        CommandEntry::new("advance", "Move the clock forward", "advance <period>", cmd_advance),
        CommandEntry::new("reverse", "Move the clock backward", "reverse <period>", cmd_reverse),
        CommandEntry::new("reset", "Return the clock to its original instant", "reset", cmd_reset),
        CommandEntry::new(
            "config",
            "Show settings, or change one and save it",
            "config [<key> <value>]",
            cmd_config,
        ),
        CommandEntry::new("help", "Show available commands", "help [command]", cmd_help),
    ]
}

pub fn print_overview(registry: &CommandRegistry) {
    output::section("Available commands");
    for entry in registry.list() {
        output::info(format!("  {:<16} {}", entry.name, entry.description));
    }
    output::info("Players may be given by name or id. Periods look like 12h, 3d, 2w, 1m or 1y.");
}

pub fn print_command(entry: &CommandEntry) {
    output::section(format!("Help: {}", entry.name));
    output::info(format!("  Description: {}", entry.description));
    output::info(format!("  Usage: {}", entry.usage));
}

fn cmd_help(_context: &mut CliContext, args: &[&str]) -> CommandResult {
    let registry = CommandRegistry::new();
    match args.first().and_then(|name| registry.get(name)) {
        Some(entry) => print_command(entry),
        None => print_overview(&registry),
    }
    Ok(())
}

/// Row of `players --json`.
#[derive(Debug, Serialize)]
struct PlayerSummary<'a> {
    id: PlayerId,
    name: &'a str,
    balance: Credits,
    days_to_insolvency: Option<i64>,
}

fn cmd_players(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let as_json = match args {
        [] => false,
        ["--json"] => true,
        _ => return Err(TrackerError::Usage("usage: players [--json]".into())),
    };
    let session = &context.session;
    let mut players: Vec<&Player> = session.ledger().players.iter().collect();
    players.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    let mut rows = Vec::with_capacity(players.len());
    for player in players {
        rows.push(PlayerSummary {
            id: player.id,
            name: &player.name,
            balance: session.balance_as_of(player.id, None)?,
            days_to_insolvency: session.time_to_insolvency(player.id, None)?,
        });
    }

    if as_json {
        let json = serde_json::to_string_pretty(&rows)
            .map_err(|err| CoreError::Serde(err.to_string()))?;
        println!("{}", json);
        return Ok(());
    }

    output::section("Players");
    if rows.is_empty() {
        output::info("No players yet. Use `add-player <name> <credits>`.");
        return Ok(());
    }
    for row in rows {
        output::info(format!(
            "  {:<16} {:>12}  {:<28} {}",
            row.name,
            row.balance.render(),
            forecast_text(row.days_to_insolvency),
            short_id(&row.id.to_string()),
        ));
    }
    Ok(())
}

fn cmd_add_player(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let [name, amount] = expect_args::<2>(args, "add-player <name> <credits>")?;
    let credits = parse_credits(amount)?;
    let id = context.session.add_player(name, credits)?;
    output::success(format!("Added {} with {} ({})", name.trim(), credits, id));
    Ok(())
}

fn cmd_remove_player(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let [query] = expect_args::<1>(args, "remove-player <player>")?;
    let player = context.session.find_player(query)?.clone();
    context.session.remove_player(player.id)?;
    output::success(format!("Removed {}", player.name));
    Ok(())
}

fn cmd_balance(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let [query] = expect_args::<1>(args, "balance <player>")?;
    let session = &context.session;
    let player = session.find_player(query)?;
    let balance = session.balance_as_of(player.id, None)?;
    output::info(format!("{}: {}", player.name, output::balance_text(balance)));
    Ok(())
}

fn cmd_total(context: &mut CliContext, _args: &[&str]) -> CommandResult {
    let total = context.session.total_balance(None)?;
    output::info(format!("Total: {}", output::balance_text(total)));
    Ok(())
}

fn cmd_forecast(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let [query] = expect_args::<1>(args, "forecast <player>")?;
    let session = &context.session;
    let player = session.find_player(query)?;
    let forecast = session.time_to_insolvency(player.id, None)?;
    let line = format!("{}: {}", player.name, forecast_text(forecast));
    match forecast {
        Some(_) => output::warning(line),
        None => output::info(line),
    }
    Ok(())
}

fn cmd_projection(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let (query, days) = player_and_days(args, "projection <player> [days]", context.config.projection_days)?;
    let session = &context.session;
    let player = session.find_player(query)?;
    let points = session.daily_projection(player.id, None, days)?;

    output::section(format!("Projection for {} ({} days)", player.name, days));
    for point in points {
        output::info(format!(
            "  day {:>4}  {}  {:>12}",
            point.day,
            point.instant.format(DATE_FORMAT),
            point.balance.render()
        ));
    }
    Ok(())
}

fn cmd_history(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let (query, days) = player_and_days(args, "history <player> [days]", context.config.history_days)?;
    let session = &context.session;
    let player = session.find_player(query)?;
    let end = session.current_instant()?;
    let start = end
        .checked_sub_signed(Duration::days(i64::from(days)))
        .ok_or_else(|| TrackerError::Usage(format!("{} days reaches before the calendar", days)))?;

    output::section(format!("History for {} (last {} days)", player.name, days));
    let timeline: Vec<TimelineEntry> = session
        .materialize_virtual_entries(player.id, start, end)
        .into_iter()
        .filter(|entry| entry.instant() >= start)
        .collect();
    if timeline.is_empty() {
        output::info("  nothing recorded");
    }
    for entry in timeline {
        let kind = if entry.is_virtual() { "scheduled" } else { "recorded" };
        output::info(format!(
            "  {}  {:>12}  {}",
            entry.instant().format(DATE_FORMAT),
            entry.amount().render(),
            kind
        ));
    }
    Ok(())
}

fn cmd_credit(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let [query, amount] = expect_args::<2>(args, "credit <player> <amount>")?;
    let amount = parse_credits(amount)?;
    let session = &context.session;
    let player = session.find_player(query)?;
    session.add_credits(player.id, amount)?;
    output::success(format!("Recorded {} for {}", amount, player.name));
    Ok(())
}

fn cmd_set(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let [query, amount] = expect_args::<2>(args, "set <player> <amount>")?;
    let target = parse_credits(amount)?;
    let session = &context.session;
    let player = session.find_player(query)?;
    match session.set_credits(player.id, target)? {
        Some(_) => output::success(format!("{} now has {}", player.name, target)),
        None => output::info(format!("{} already has {}", player.name, target)),
    }
    Ok(())
}

fn cmd_distribute(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let [amount] = expect_args::<1>(args, "distribute <amount>")?;
    let total: i64 = amount
        .trim()
        .parse()
        .map_err(|_| TrackerError::Usage(format!("`{}` is not a whole amount", amount)))?;
    let session = &context.session;
    if session.ledger().players.is_empty() {
        output::warning("No players to distribute to");
        return Ok(());
    }
    for (player_id, share) in session.distribute(total)? {
        let name = session
            .ledger()
            .player(player_id)
            .map(|player| player.name.as_str())
            .unwrap_or("?");
        output::info(format!("  {:<16} {:>12}", name, Credits::from(share).render()));
    }
    output::success(format!("Distributed {}", Credits::from(total)));
    Ok(())
}

fn cmd_pay(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let [query, name, amount, period] =
        expect_args::<4>(args, "pay <player> <name> <amount> <period>")?;
    let amount = parse_credits(amount)?;
    let period = Period::parse_shorthand(period)?;
    let rule = RecurringPayment::new(amount, period)?;
    let session = &context.session;
    let player = session.find_player(query)?;
    let id = session.add_scheduled_payment(player.id, name, rule, None)?;
    output::success(format!(
        "Scheduled {} ({}) for {} [{}]",
        name,
        rule_label(&rule),
        player.name,
        short_id(&id.to_string())
    ));
    Ok(())
}

fn cmd_pay_all(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let [name, amount, period] = expect_args::<3>(args, "pay-all <name> <amount> <period>")?;
    let total: i64 = amount
        .trim()
        .parse()
        .map_err(|_| TrackerError::Usage(format!("`{}` is not a whole amount", amount)))?;
    let period = Period::parse_shorthand(period)?;
    let session = &context.session;
    if session.ledger().players.is_empty() {
        output::warning("No players to split the payment across");
        return Ok(());
    }
    for (player_id, share, id) in session.distribute_scheduled_payment(name, total, period, None)? {
        let player = session
            .ledger()
            .player(player_id)
            .map(|player| player.name.as_str())
            .unwrap_or("?");
        output::info(format!(
            "  {:<16} {:>12}  [{}]",
            player,
            Credits::from(share).render(),
            short_id(&id.to_string())
        ));
    }
    output::success(format!("Scheduled {} split across all players", name.trim()));
    Ok(())
}

fn cmd_payments(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let [query] = expect_args::<1>(args, "payments <player>")?;
    let session = &context.session;
    let player = session.find_player(query)?;
    let payments = session.active_scheduled_payments(player.id, None)?;

    output::section(format!("Scheduled payments for {}", player.name));
    if payments.is_empty() {
        output::info("  none active");
    }
    for payment in payments {
        let mut line = format!(
            "  [{}] {:<16} {:<16} since {}",
            short_id(&payment.id.to_string()),
            payment.name,
            rule_label(&payment.rule),
            payment.start_instant.format(DATE_FORMAT)
        );
        if let Some(end) = payment.end_instant {
            line.push_str(&format!(" until {}", end.format(DATE_FORMAT)));
        }
        output::info(line);
    }
    Ok(())
}

fn cmd_end_payment(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let [query] = expect_args::<1>(args, "end-payment <id>")?;
    let session = &context.session;
    let Ok(payment) = session.find_scheduled_payment(query) else {
        output::warning(format!("No scheduled payment matches `{}`", query));
        return Ok(());
    };
    let name = payment.name.clone();
    if session.end_scheduled_payment(payment.id)? {
        output::success(format!("Ended {}", name));
    }
    Ok(())
}

fn cmd_remove_payment(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let [query] = expect_args::<1>(args, "remove-payment <id>")?;
    let session = &context.session;
    let Ok(payment) = session.find_scheduled_payment(query) else {
        output::warning(format!("No scheduled payment matches `{}`", query));
        return Ok(());
    };
    let name = payment.name.clone();
    if session.remove_scheduled_payment(payment.id)? {
        output::success(format!("Removed {}", name));
    }
    Ok(())
}

fn cmd_time(context: &mut CliContext, _args: &[&str]) -> CommandResult {
    let clock = context.session.gateway().clock_state()?;
    output::info(format!("Current:  {}", clock.current().format(DATE_FORMAT)));
    output::info(format!("Original: {}", clock.original().format(DATE_FORMAT)));
    Ok(())
}

fn cmd_advance(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let [period] = expect_args::<1>(args, "advance <period>")?;
    let now = context.session.advance(Period::parse_shorthand(period)?)?;
    output::success(format!("Clock advanced to {}", format_instant(now)));
    Ok(())
}

fn cmd_reverse(context: &mut CliContext, args: &[&str]) -> CommandResult {
    let [period] = expect_args::<1>(args, "reverse <period>")?;
    let now = context.session.reverse(Period::parse_shorthand(period)?)?;
    output::success(format!("Clock reversed to {}", format_instant(now)));
    Ok(())
}

fn cmd_reset(context: &mut CliContext, _args: &[&str]) -> CommandResult {
    let now = context.session.reset()?;
    output::success(format!("Clock reset to {}", format_instant(now)));
    Ok(())
}

fn cmd_config(context: &mut CliContext, args: &[&str]) -> CommandResult {
    match args {
        [] => {
            output::section(format!(
                "Settings ({})",
                context.config_manager.config_path().display()
            ));
            for (key, value) in context.config.settings() {
                let value = if value.is_empty() { "-".to_string() } else { value };
                output::info(format!("  {:<24} {}", key, value));
            }
        }
        [key, value] => {
            context.config = context.config_manager.update(key, value)?;
            output::success(format!("Saved {} = {}", key, value.trim()));
        }
        _ => return Err(TrackerError::Usage("usage: config [<key> <value>]".into())),
    }
    Ok(())
}

fn expect_args<'a, const N: usize>(args: &[&'a str], usage: &str) -> Result<[&'a str; N], TrackerError> {
    <[&str; N]>::try_from(args).map_err(|_| TrackerError::Usage(format!("usage: {}", usage)))
}

fn player_and_days<'a>(
    args: &[&'a str],
    usage: &str,
    default_days: u32,
) -> Result<(&'a str, u32), TrackerError> {
    match args {
        [query] => Ok((*query, default_days)),
        [query, days] => {
            let days = days
                .trim()
                .parse()
                .map_err(|_| TrackerError::Usage(format!("`{}` is not a day count", days)))?;
            Ok((*query, days))
        }
        _ => Err(TrackerError::Usage(format!("usage: {}", usage))),
    }
}

fn parse_credits(raw: &str) -> Result<Credits, TrackerError> {
    let value: f64 = raw
        .trim()
        .replace('_', "")
        .parse()
        .map_err(|_| TrackerError::Usage(format!("`{}` is not an amount", raw)))?;
    if !value.is_finite() {
        return Err(TrackerError::Usage(format!("`{}` is not an amount", raw)));
    }
    Ok(Credits::new(value))
}

fn forecast_text(days: Option<i64>) -> String {
    match days {
        None => "never runs out".into(),
        Some(0) => "out of credits".into(),
        Some(1) => "runs out in 1 day".into(),
        Some(days) => format!("runs out in {} days", days),
    }
}

fn rule_label(rule: &RecurringPayment) -> String {
    rule.label()
        .unwrap_or_else(|_| format!("{} every {}", rule.amount(), rule.period()))
}

fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format(DATE_FORMAT).to_string()
}
