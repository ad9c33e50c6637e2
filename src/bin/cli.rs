use chrono::NaiveDate;
use polars::prelude::{AnyValue, DataFrame};
use release_capacity::loader::{
    load_allocations_from_csv, load_allocations_from_json, load_config_from_json,
};
use release_capacity::report::round_tenth;
use release_capacity::validation::check_allocations_with;
use release_capacity::{
    Allocation, AllocationSet, CapacityAggregator, CapacityConfig, ResourceId,
};
use std::fs::File;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn render_text_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if cell.len() > widths[ci] {
                widths[ci] = cell.len();
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_line = |cells: &[String]| {
        let mut line = String::from("|");
        for (ci, cell) in cells.iter().enumerate() {
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(cell.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_line(headers));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        out.push_str(&render_line(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let headers: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
    let rows: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| match col.get(row_idx) {
                    Ok(AnyValue::Null) | Err(_) => String::new(),
                    Ok(AnyValue::Float64(v)) => format!("{v:.1}"),
                    Ok(AnyValue::String(s)) => s.to_string(),
                    Ok(av) => av.to_string(),
                })
                .collect()
        })
        .collect();
    render_text_table(&headers, &rows)
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn render_allocations(allocations: &[Allocation]) -> String {
    let rows: Vec<Vec<String>> = allocations
        .iter()
        .map(|a| {
            vec![
                a.resource_id.to_string(),
                a.resource_name.clone(),
                a.phase.clone().unwrap_or_default(),
                a.start_date.to_string(),
                a.end_date.to_string(),
                a.allocation_factor.to_string(),
                a.allocation_days.map(|v| v.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    render_text_table(
        &headers(&[
            "resource_id",
            "resource_name",
            "phase",
            "start_date",
            "end_date",
            "allocation_factor",
            "allocation_days",
        ]),
        &rows,
    )
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  load json|csv <path>               Replace allocations from a file\n  add <resource_id> <name> <start> <end> <factor> [phase]\n                                     Append an allocation (dates YYYY-MM-DD)\n  clear                              Remove all allocations\n  show                               Show current allocations\n  weeks                              List the weeks spanned by the allocations\n  week <YYYY-MM-DD>                  Per-resource load for one week\n  grid                               Resource x week load grid\n  conflicts                          Weeks over capacity per resource\n  summary                            One-line capacity summary\n  check                              Lint allocations\n  capacity <days>                    Set the weekly capacity\n  config <path>                      Load a capacity config (JSON)\n  export grid <csv_path>             Write the grid as CSV\n  export conflicts <json_path>       Write conflicts as JSON\n  quit|exit                          Exit"
    );
}

fn initial_aggregator() -> CapacityAggregator {
    let mut config = CapacityConfig::default();
    if let Err(e) = config.apply_env_overrides() {
        eprintln!("Config error: {e}; using defaults");
        config = CapacityConfig::default();
    }
    match CapacityAggregator::from_config(&config) {
        Ok(aggregator) => aggregator,
        Err(e) => {
            eprintln!("Config error: {e}; using defaults");
            CapacityAggregator::default()
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut aggregator = initial_aggregator();
    let mut allocations = AllocationSet::empty();

    println!(
        "Release Capacity (CLI) - capacity {} days/week - type 'help' for commands\n",
        aggregator.max_weekly_days()
    );

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "load" => {
                let result = match (parts.next(), parts.next()) {
                    (Some("json"), Some(path)) => load_allocations_from_json(path),
                    (Some("csv"), Some(path)) => load_allocations_from_csv(path),
                    _ => {
                        println!("Usage: load json|csv <path>");
                        continue;
                    }
                };
                match result {
                    Ok(set) => {
                        allocations = set;
                        println!("Loaded {} allocations.", allocations.len());
                    }
                    Err(e) => println!("Load error: {e}"),
                }
            }
            "add" => {
                let args: Vec<&str> = parts.collect();
                if args.len() < 5 {
                    println!("Usage: add <resource_id> <name> <start> <end> <factor> [phase]");
                    continue;
                }
                let (Some(start), Some(end)) = (parse_date(args[2]), parse_date(args[3])) else {
                    println!("Invalid date (YYYY-MM-DD)");
                    continue;
                };
                let factor: f64 = match args[4].parse() {
                    Ok(v) => v,
                    Err(_) => {
                        println!("Invalid factor");
                        continue;
                    }
                };
                let mut allocation =
                    Allocation::new(ResourceId::parse(args[0]), args[1], start, end, factor);
                if let Some(phase) = args.get(5) {
                    allocation = allocation.with_phase(*phase);
                }
                allocations.push(allocation);
                println!("Allocation added.\n{}", render_allocations(&allocations));
            }
            "clear" => {
                allocations = AllocationSet::empty();
                println!("Allocations cleared.");
            }
            "show" => println!("{}", render_allocations(&allocations)),
            "weeks" => {
                let weeks = aggregator.weeks(&allocations);
                if weeks.is_empty() {
                    println!("No weeks.");
                }
                for week in weeks {
                    println!("{week}");
                }
            }
            "week" => {
                let Some(week) = parts.next().and_then(parse_date) else {
                    println!("Usage: week <YYYY-MM-DD>");
                    continue;
                };
                let rows: Vec<Vec<String>> = aggregator
                    .weekly_loads(week, &allocations)
                    .into_values()
                    .map(|load| {
                        vec![
                            load.resource_id.to_string(),
                            load.resource_name.clone(),
                            format!("{:.1}", load.display_allocated()),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    render_text_table(&headers(&["resource_id", "resource_name", "allocated"]), &rows)
                );
            }
            "grid" => match aggregator.grid(&allocations).to_dataframe() {
                Ok(df) => println!("{}", render_df_as_text_table(&df)),
                Err(e) => println!("Grid error: {e}"),
            },
            "conflicts" => {
                let conflicts = aggregator.conflicts(&allocations);
                if conflicts.is_empty() {
                    println!("No conflicts.");
                    continue;
                }
                let rows: Vec<Vec<String>> = conflicts
                    .iter()
                    .flat_map(|record| {
                        record.weekly_conflicts.iter().map(move |weekly| {
                            vec![
                                record.resource_id.to_string(),
                                record.resource_name.clone(),
                                weekly.week_starting.to_string(),
                                format!("{:.1}", round_tenth(weekly.total_allocation)),
                                weekly.max_allocation.to_string(),
                                format!("{:.1}", round_tenth(weekly.over_allocation)),
                            ]
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    render_text_table(
                        &headers(&[
                            "resource_id",
                            "resource_name",
                            "week_starting",
                            "total",
                            "max",
                            "over",
                        ]),
                        &rows,
                    )
                );
            }
            "summary" => {
                println!("{}", aggregator.report(&allocations).summary.to_cli_summary());
            }
            "check" => {
                let issues = check_allocations_with(&allocations, aggregator.calendar());
                if issues.is_empty() {
                    println!("No issues.");
                }
                for issue in issues {
                    println!("{issue}");
                }
            }
            "capacity" => {
                let Some(days) = parts.next().and_then(|s| s.parse::<f64>().ok()) else {
                    println!("Usage: capacity <days>");
                    continue;
                };
                match aggregator.clone().with_max_weekly_days(days) {
                    Ok(updated) => {
                        aggregator = updated;
                        println!("Capacity set to {days} days/week.");
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "config" => {
                let Some(path) = parts.next() else {
                    println!("Usage: config <path>");
                    continue;
                };
                match load_config_from_json(path)
                    .map_err(|e| e.to_string())
                    .and_then(|config| {
                        CapacityAggregator::from_config(&config).map_err(|e| e.to_string())
                    }) {
                    Ok(updated) => {
                        aggregator = updated;
                        println!(
                            "Config loaded (capacity {} days/week).",
                            aggregator.max_weekly_days()
                        );
                    }
                    Err(e) => println!("Config error: {e}"),
                }
            }
            "export" => match (parts.next(), parts.next()) {
                (Some("grid"), Some(path)) => {
                    let result = File::create(path)
                        .map_err(|e| e.to_string())
                        .and_then(|file| {
                            aggregator
                                .grid(&allocations)
                                .write_csv(file)
                                .map_err(|e| e.to_string())
                        });
                    match result {
                        Ok(()) => println!("Grid written to {path}."),
                        Err(e) => println!("Export error: {e}"),
                    }
                }
                (Some("conflicts"), Some(path)) => {
                    let conflicts = aggregator.conflicts(&allocations);
                    let result = File::create(path)
                        .map_err(|e| e.to_string())
                        .and_then(|file| {
                            serde_json::to_writer_pretty(file, &conflicts).map_err(|e| e.to_string())
                        });
                    match result {
                        Ok(()) => println!("Conflicts written to {path}."),
                        Err(e) => println!("Export error: {e}"),
                    }
                }
                _ => println!("Usage: export grid|conflicts <path>"),
            },
            _ => {
                println!("Unknown command. Type 'help'.");
            }
        }
    }
}
