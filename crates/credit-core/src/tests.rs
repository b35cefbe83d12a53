use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{
    clock_service::ClockService, forecast_service::ForecastService,
    ledger_service::LedgerService, payment_service::PaymentService,
    player_service::PlayerService, time::FixedClock, LedgerGateway, MemoryGateway,
};
use credit_domain::{
    Credits, Ledger, LedgerEntry, Period, Player, PlayerId, RecurringPayment, ScheduledPayment,
    SimulationClock, TimelineEntry,
};

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn rule(amount: f64, period: Period) -> RecurringPayment {
    RecurringPayment::new(Credits::new(amount), period).expect("valid rule")
}

fn ledger_with_player(name: &str) -> (Ledger, PlayerId) {
    let mut ledger = Ledger::new();
    let id = ledger.add_player(Player::new(name));
    (ledger, id)
}

fn credit(ledger: &mut Ledger, player: PlayerId, amount: f64, instant: DateTime<Utc>) {
    ledger.add_entry(LedgerEntry::new(player, Credits::new(amount), instant));
}

fn schedule(
    ledger: &mut Ledger,
    player: PlayerId,
    name: &str,
    rule: RecurringPayment,
    start: DateTime<Utc>,
) {
    ledger.add_scheduled_payment(ScheduledPayment::new(player, name, rule, start, None));
}

#[test]
fn balance_combines_entries_and_elapsed_occurrences() {
    let (mut ledger, player) = ledger_with_player("Parker");
    credit(&mut ledger, player, 1_000.0, at(2525, 1, 1));
    credit(&mut ledger, player, 250.0, at(2525, 2, 1));
    schedule(&mut ledger, player, "Berth", rule(100.0, Period::weeks(1)), at(2525, 1, 1));

    // Jan 1, 8, 15 have elapsed by Jan 20; the February entry has not.
    assert_eq!(
        LedgerService::balance_as_of(&ledger, player, at(2525, 1, 20)),
        Credits::new(700.0)
    );
}

#[test]
fn ended_payments_no_longer_count_toward_balance() {
    let (mut ledger, player) = ledger_with_player("Brett");
    credit(&mut ledger, player, 500.0, at(2525, 1, 1));
    ledger.add_scheduled_payment(ScheduledPayment::new(
        player,
        "Rations",
        rule(50.0, Period::days(1)),
        at(2525, 1, 1),
        Some(at(2525, 1, 3)),
    ));

    assert_eq!(
        LedgerService::balance_as_of(&ledger, player, at(2525, 1, 3)),
        Credits::new(350.0)
    );
    assert_eq!(
        LedgerService::balance_as_of(&ledger, player, at(2525, 1, 10)),
        Credits::new(500.0)
    );
}

#[test]
fn balance_is_additive_across_instants() {
    let (mut ledger, player) = ledger_with_player("Kane");
    credit(&mut ledger, player, 900.0, at(2525, 1, 1));
    credit(&mut ledger, player, 40.0, at(2525, 1, 12));
    credit(&mut ledger, player, -15.0, at(2525, 1, 25));
    schedule(&mut ledger, player, "Air", rule(30.0, Period::days(5)), at(2525, 1, 1));

    let t1 = at(2525, 1, 10);
    let t2 = at(2525, 1, 30);
    let entries: Credits = ledger
        .entries_for(player)
        .filter(|entry| entry.instant > t1 && entry.instant <= t2)
        .map(|entry| entry.amount)
        .sum();
    let accrued = LedgerService::periodic_delta(&ledger, player, t2)
        - LedgerService::periodic_delta(&ledger, player, t1);

    assert_eq!(
        LedgerService::balance_as_of(&ledger, player, t2)
            - LedgerService::balance_as_of(&ledger, player, t1),
        entries + accrued
    );
    // Jan 11, 16, 21, 26 fall inside (t1, t2].
    assert_eq!(accrued, Credits::new(-120.0));
}

#[test]
fn active_payments_are_ordered_by_start_then_name() {
    let (mut ledger, player) = ledger_with_player("Ash");
    schedule(&mut ledger, player, "Zeta", rule(1.0, Period::days(1)), at(2525, 1, 2));
    schedule(&mut ledger, player, "Beta", rule(1.0, Period::days(1)), at(2525, 1, 1));
    schedule(&mut ledger, player, "Alpha", rule(1.0, Period::days(1)), at(2525, 1, 2));
    schedule(&mut ledger, player, "Later", rule(1.0, Period::days(1)), at(2525, 6, 1));

    let names: Vec<_> = LedgerService::active_scheduled_payments(&ledger, player, at(2525, 2, 1))
        .into_iter()
        .map(|payment| payment.name.as_str())
        .collect();
    assert_eq!(names, vec!["Beta", "Alpha", "Zeta"]);
}

#[test]
fn materialized_timeline_merges_recorded_and_virtual_entries() {
    let (mut ledger, player) = ledger_with_player("Ripley");
    credit(&mut ledger, player, 300.0, at(2525, 1, 1));
    credit(&mut ledger, player, 20.0, at(2525, 1, 9));
    schedule(&mut ledger, player, "Dock", rule(100.0, Period::weeks(1)), at(2525, 1, 1));

    let timeline =
        LedgerService::materialize_virtual_entries(&ledger, player, at(2525, 1, 1), at(2525, 1, 15));
    let shape: Vec<_> = timeline
        .iter()
        .map(|entry| (entry.instant(), entry.amount().value(), entry.is_virtual()))
        .collect();
    assert_eq!(
        shape,
        vec![
            (at(2525, 1, 1), 300.0, false),
            (at(2525, 1, 1), -100.0, true),
            (at(2525, 1, 8), -100.0, true),
            (at(2525, 1, 9), 20.0, false),
            (at(2525, 1, 15), -100.0, true),
        ]
    );
    assert!(matches!(&timeline[1], TimelineEntry::Virtual { player_id, .. } if *player_id == player));
}

#[test]
fn insolvency_for_weekly_debit_lands_on_day_35() {
    let (mut ledger, player) = ledger_with_player("Hicks");
    let today = at(2525, 1, 1);
    credit(&mut ledger, player, 500.0, today);
    schedule(&mut ledger, player, "Armor", rule(100.0, Period::weeks(1)), today);

    assert_eq!(
        ForecastService::time_to_insolvency(&ledger, player, today).unwrap(),
        Some(35)
    );
}

#[test]
fn negative_balance_is_already_insolvent() {
    let (mut ledger, player) = ledger_with_player("Hudson");
    let today = at(2525, 1, 1);
    credit(&mut ledger, player, -50.0, today);
    schedule(&mut ledger, player, "Ammo", rule(10.0, Period::weeks(1)), today);
    assert_eq!(
        ForecastService::time_to_insolvency(&ledger, player, today).unwrap(),
        Some(0)
    );
}

#[test]
fn nothing_scheduled_means_never_insolvent() {
    let (mut ledger, player) = ledger_with_player("Vasquez");
    credit(&mut ledger, player, -50.0, at(2525, 1, 1));
    assert_eq!(
        ForecastService::time_to_insolvency(&ledger, player, at(2525, 1, 1)).unwrap(),
        None
    );

    let (mut ledger, player) = ledger_with_player("Drake");
    credit(&mut ledger, player, 50.0, at(2525, 1, 1));
    assert_eq!(
        ForecastService::time_to_insolvency(&ledger, player, at(2525, 1, 1)).unwrap(),
        None
    );
}

#[test]
fn coinciding_payments_are_consolidated_before_the_walk() {
    let (mut ledger, player) = ledger_with_player("Gorman");
    let today = at(2525, 1, 1);
    credit(&mut ledger, player, 379.0, today);
    schedule(&mut ledger, player, "Weekly", rule(80.0, Period::weeks(1)), today);
    schedule(&mut ledger, player, "Biweekly", rule(70.0, Period::weeks(2)), today);

    let horizon = at(2525, 1, 20);
    let schedule = ForecastService::consolidated_schedule(&ledger, player, today, horizon);
    assert_eq!(schedule.len(), 2);
    assert_eq!(schedule[0].instant, at(2525, 1, 8));
    assert_eq!(schedule[0].amount, Credits::new(80.0));
    assert_eq!(schedule[1].instant, at(2525, 1, 15));
    assert_eq!(schedule[1].amount, Credits::new(150.0));

    // 229 after today's debits, 149 after Jan 8, short of the combined 150.
    assert_eq!(
        ForecastService::time_to_insolvency(&ledger, player, today).unwrap(),
        Some(14)
    );
}

#[test]
fn weekly_payment_inactive_at_as_of_is_ignored() {
    let (mut ledger, player) = ledger_with_player("Bishop");
    let today = at(2525, 1, 1);
    credit(&mut ledger, player, 10.0, today);
    schedule(&mut ledger, player, "Future", rule(100.0, Period::weeks(1)), at(2525, 2, 1));
    assert_eq!(
        ForecastService::time_to_insolvency(&ledger, player, today).unwrap(),
        None
    );
}

#[test]
fn horizon_bounds_the_forecast() {
    let (mut ledger, player) = ledger_with_player("Newt");
    let today = at(2525, 1, 1);
    credit(&mut ledger, player, 1_000.0, today);
    schedule(&mut ledger, player, "Tithe", rule(100.0, Period::months(1)), today);

    assert_eq!(
        ForecastService::time_to_insolvency_within(&ledger, player, today, Period::months(6))
            .unwrap(),
        None
    );
    // 900 after the first debit, nine more months covered, shortfall on Nov 1.
    assert_eq!(
        ForecastService::time_to_insolvency(&ledger, player, today).unwrap(),
        Some((at(2525, 11, 1) - today).num_days())
    );
}

#[test]
fn forecast_is_consistent_with_the_schedule() {
    let (mut ledger, player) = ledger_with_player("Apone");
    let today = at(2525, 3, 3);
    credit(&mut ledger, player, 777.0, today);
    schedule(&mut ledger, player, "Daily", rule(13.0, Period::days(1)), today);
    schedule(&mut ledger, player, "Weekly", rule(45.0, Period::weeks(1)), today);

    let days = ForecastService::time_to_insolvency(&ledger, player, today)
        .unwrap()
        .expect("runs out");
    let horizon = Period::years(5).checked_add_to(today).unwrap();
    let schedule = ForecastService::consolidated_schedule(&ledger, player, today, horizon);

    let mut balance = LedgerService::balance_as_of(&ledger, player, today);
    for debit in schedule {
        if (debit.instant - today).num_days() >= days {
            assert!(balance.is_less_than(&debit.amount));
            break;
        }
        balance = balance - debit.amount;
        assert!(balance.value() >= 0.0);
    }
}

#[test]
fn projection_starts_at_current_balance_and_steps_daily() {
    let (mut ledger, player) = ledger_with_player("Frost");
    let today = at(2525, 1, 1);
    credit(&mut ledger, player, 100.0, today);
    credit(&mut ledger, player, 25.0, at(2525, 1, 3));
    schedule(&mut ledger, player, "Daily", rule(10.0, Period::days(1)), today);

    let points = ForecastService::daily_projection(&ledger, player, today, 4).unwrap();
    let balances: Vec<_> = points.iter().map(|point| point.balance.value()).collect();
    assert_eq!(balances, vec![90.0, 80.0, 95.0, 85.0]);
    assert_eq!(points[3].day, 3);
    assert_eq!(points[3].instant, today + Duration::days(3));
    assert!(ForecastService::daily_projection(&ledger, player, today, 0)
        .unwrap()
        .is_empty());
}

#[test]
fn projection_buckets_off_midnight_debits_by_elapsed_days() {
    let (mut ledger, player) = ledger_with_player("Spunkmeyer");
    let today = at(2525, 1, 1);
    credit(&mut ledger, player, 100.0, today - Duration::days(1));
    schedule(
        &mut ledger,
        player,
        "Night shift",
        rule(10.0, Period::days(1)),
        today - Duration::hours(12),
    );

    let points = ForecastService::daily_projection(&ledger, player, today, 3).unwrap();
    let balances: Vec<_> = points.iter().map(|point| point.balance.value()).collect();
    assert_eq!(balances, vec![80.0, 70.0, 60.0]);
}

#[test]
fn distribution_gives_remainder_to_first_players() {
    let players: Vec<_> = (0..3).map(|_| uuid::Uuid::new_v4()).collect();
    let shares: Vec<_> = PlayerService::distribute(100, &players)
        .into_iter()
        .map(|(_, share)| share)
        .collect();
    assert_eq!(shares, vec![34, 33, 33]);

    let negative: Vec<_> = PlayerService::distribute(-5, &players)
        .into_iter()
        .map(|(_, share)| share)
        .collect();
    assert_eq!(negative, vec![-2, -2, -1]);
    assert!(PlayerService::distribute(10, &[]).is_empty());
}

#[test]
fn distribution_handles_extreme_totals() {
    let solo = [uuid::Uuid::new_v4()];
    assert_eq!(PlayerService::distribute(i64::MIN, &solo)[0].1, i64::MIN);
    assert_eq!(PlayerService::distribute(i64::MAX, &solo)[0].1, i64::MAX);

    let pair = [uuid::Uuid::new_v4(), uuid::Uuid::new_v4()];
    let shares: Vec<_> = PlayerService::distribute(i64::MIN, &pair)
        .into_iter()
        .map(|(_, share)| share)
        .collect();
    assert_eq!(shares, vec![i64::MIN / 2, i64::MIN / 2]);
}

fn memory_gateway() -> MemoryGateway {
    MemoryGateway::new(SimulationClock::new(at(2525, 1, 1)))
}

#[test]
fn player_service_records_opening_and_set_credits_difference() {
    let gateway = memory_gateway();
    let now = gateway.current_instant().unwrap();
    let player = PlayerService::add_player(&gateway, "Ferro", Credits::new(200.0), now).unwrap();

    let ledger = gateway.snapshot().unwrap();
    assert_eq!(LedgerService::balance_as_of(&ledger, player, now), Credits::new(200.0));

    PlayerService::set_credits(&gateway, &ledger, player, Credits::new(50.0), now).unwrap();
    let ledger = gateway.snapshot().unwrap();
    assert_eq!(ledger.entries.last().unwrap().amount, Credits::new(-150.0));
    assert_eq!(LedgerService::balance_as_of(&ledger, player, now), Credits::new(50.0));

    assert_eq!(
        PlayerService::set_credits(&gateway, &ledger, player, Credits::new(50.0), now).unwrap(),
        None
    );
}

#[test]
fn player_service_rejects_unknown_players_and_blank_names() {
    let gateway = memory_gateway();
    let now = gateway.current_instant().unwrap();
    let ledger = gateway.snapshot().unwrap();
    assert!(matches!(
        PlayerService::add_credits(&gateway, &ledger, uuid::Uuid::new_v4(), Credits::new(1.0), now),
        Err(crate::CoreError::PlayerNotFound(_))
    ));
    assert!(matches!(
        PlayerService::add_player(&gateway, "  ", Credits::ZERO, now),
        Err(crate::CoreError::Validation(_))
    ));
}

#[test]
fn removing_a_player_cascades() {
    let gateway = memory_gateway();
    let now = gateway.current_instant().unwrap();
    let player = PlayerService::add_player(&gateway, "Spunkmeyer", Credits::new(10.0), now).unwrap();
    let ledger = gateway.snapshot().unwrap();
    PaymentService::schedule(
        &gateway,
        &ledger,
        player,
        "Dropship",
        rule(5.0, Period::days(1)),
        now,
        None,
    )
    .unwrap();

    PlayerService::remove_player(&gateway, player).unwrap();
    let ledger = gateway.snapshot().unwrap();
    assert!(ledger.players.is_empty());
    assert!(ledger.entries.is_empty());
    assert!(ledger.scheduled_payments.is_empty());
}

#[test]
fn ending_a_payment_closes_it_the_day_before_now() {
    let gateway = memory_gateway();
    let now = gateway.current_instant().unwrap();
    let player = PlayerService::add_player(&gateway, "Dietrich", Credits::new(10.0), now).unwrap();
    let ledger = gateway.snapshot().unwrap();
    let payment = PaymentService::schedule(
        &gateway,
        &ledger,
        player,
        "Medkit",
        rule(5.0, Period::days(1)),
        now - Duration::days(10),
        None,
    )
    .unwrap();

    let ledger = gateway.snapshot().unwrap();
    assert!(PaymentService::end(&gateway, &ledger, payment, now).unwrap());
    let ledger = gateway.snapshot().unwrap();
    let stored = ledger.scheduled_payment(payment).unwrap();
    assert_eq!(stored.end_instant, Some(now - Duration::days(1)));
    assert!(LedgerService::active_scheduled_payments(&ledger, player, now).is_empty());
}

#[test]
fn lifecycle_operations_on_unknown_ids_are_no_ops() {
    let gateway = memory_gateway();
    let ledger = gateway.snapshot().unwrap();
    let missing = uuid::Uuid::new_v4();
    let now = gateway.current_instant().unwrap();
    assert!(!PaymentService::end(&gateway, &ledger, missing, now).unwrap());
    assert!(!PaymentService::remove(&gateway, &ledger, missing).unwrap());
}

#[test]
fn mutations_are_not_visible_in_an_old_snapshot() {
    let gateway = memory_gateway();
    let now = gateway.current_instant().unwrap();
    let before = gateway.snapshot().unwrap();
    PlayerService::add_player(&gateway, "Crowe", Credits::new(1.0), now).unwrap();
    assert!(before.players.is_empty());
    assert_eq!(gateway.snapshot().unwrap().players.len(), 1);
}

#[test]
fn clock_service_moves_the_gateway_clock() {
    let gateway = memory_gateway();
    let start = ClockService::current(&gateway).unwrap();

    ClockService::advance(&gateway, Period::months(1)).unwrap();
    assert_eq!(ClockService::current(&gateway).unwrap(), at(2525, 2, 1));

    ClockService::reverse(&gateway, Period::days(3)).unwrap();
    assert_eq!(ClockService::current(&gateway).unwrap(), at(2525, 1, 29));

    assert_eq!(ClockService::reset(&gateway).unwrap(), start);
}

#[test]
fn initial_clock_is_offset_from_the_wall_clock() {
    let wall = FixedClock(Utc.with_ymd_and_hms(2024, 6, 30, 18, 45, 0).unwrap());
    let clock = ClockService::initial_state(&wall, 500).unwrap();
    assert_eq!(clock.current(), at(2524, 6, 30));
    assert_eq!(clock.original(), at(2524, 6, 30));
}

#[test]
fn split_payment_schedules_one_share_per_player() {
    let gateway = memory_gateway();
    let now = gateway.current_instant().unwrap();
    let ids: Vec<_> = ["Apone", "Dietrich", "Wierzbowski"]
        .iter()
        .map(|name| PlayerService::add_player(&gateway, name, Credits::new(500.0), now).unwrap())
        .collect();
    let ledger = gateway.snapshot().unwrap();

    let scheduled =
        PaymentService::schedule_split(&gateway, &ledger, &ids, "Dropship", 100, Period::weeks(1), now)
            .unwrap();
    let shares: Vec<_> = scheduled.iter().map(|(_, share, _)| *share).collect();
    assert_eq!(shares, vec![34, 33, 33]);

    let ledger = gateway.snapshot().unwrap();
    assert_eq!(ledger.scheduled_payments.len(), 3);
    let first = ledger.scheduled_payment(scheduled[0].2).unwrap();
    assert_eq!(first.player_id, ids[0]);
    assert_eq!(first.rule.amount(), Credits::new(34.0));
    assert_eq!(first.start_instant, now);
    assert_eq!(
        LedgerService::balance_as_of(&ledger, ids[1], now),
        Credits::new(467.0)
    );
}

#[test]
fn split_payment_skips_zero_shares() {
    let gateway = memory_gateway();
    let now = gateway.current_instant().unwrap();
    let ids: Vec<_> = ["Crowe", "Hudson"]
        .iter()
        .map(|name| PlayerService::add_player(&gateway, name, Credits::ZERO, now).unwrap())
        .collect();
    let ledger = gateway.snapshot().unwrap();

    let scheduled =
        PaymentService::schedule_split(&gateway, &ledger, &ids, "Tip", 1, Period::days(1), now)
            .unwrap();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].0, ids[0]);
    assert_eq!(gateway.snapshot().unwrap().scheduled_payments.len(), 1);
}
