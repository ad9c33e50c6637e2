use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use release_capacity::weeks::week_end;
use release_capacity::{Allocation, CapacityAggregator, ResourceId, WorkCalendar, enumerate_weeks};

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn allocation_strategy() -> impl Strategy<Value = Allocation> {
    (0i64..4, 0u64..120, 0u64..45, 1u32..=10).prop_map(|(id, offset, span, tenths)| {
        let start = base() + Days::new(offset);
        let end = start + Days::new(span);
        Allocation::new(id, format!("R{id}"), start, end, f64::from(tenths) / 10.0)
    })
}

proptest! {
    #[test]
    fn every_allocated_day_falls_in_a_returned_week(
        allocations in prop::collection::vec(allocation_strategy(), 1..8)
    ) {
        let weeks = enumerate_weeks(&allocations);
        prop_assert!(weeks.windows(2).all(|pair| pair[0] < pair[1]));

        for allocation in &allocations {
            for day in allocation.start_date.iter_days().take_while(|day| *day <= allocation.end_date) {
                prop_assert!(weeks.iter().any(|week| *week <= day && day <= week_end(*week)));
            }
        }
        for week in &weeks {
            prop_assert!(allocations
                .iter()
                .any(|a| a.start_date <= week_end(*week) && a.end_date >= *week));
        }
    }

    #[test]
    fn weekly_loads_sum_to_each_resources_working_days(
        allocations in prop::collection::vec(allocation_strategy(), 1..8)
    ) {
        let aggregator = CapacityAggregator::default();
        let calendar = WorkCalendar::default();
        let weeks = aggregator.weeks(&allocations);

        for id in 0i64..4 {
            let resource = ResourceId::Number(id);
            let expected: f64 = allocations
                .iter()
                .filter(|a| a.resource_id == resource)
                .map(|a| calendar.count_available_days(a.start_date, a.end_date) as f64 * a.allocation_factor)
                .sum();
            let actual: f64 = weeks
                .iter()
                .filter_map(|week| {
                    aggregator
                        .weekly_loads(*week, &allocations)
                        .get(&resource)
                        .map(|load| load.allocated)
                })
                .sum();
            prop_assert!((expected - actual).abs() < 1e-9);
        }
    }

    #[test]
    fn repeated_reports_are_identical(
        allocations in prop::collection::vec(allocation_strategy(), 0..8),
        capacity in 0.0f64..8.0,
    ) {
        let aggregator = CapacityAggregator::default().with_max_weekly_days(capacity).unwrap();
        let first = aggregator.report(&allocations);
        let second = aggregator.report(&allocations);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.conflicts, aggregator.conflicts(&allocations));
    }
}
