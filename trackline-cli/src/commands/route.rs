//! `trackline route`: resolve one route through the configured provider.

use trackline::coord::Coordinate;
use trackline::route::RouteResolution;

use super::common::build_gateway;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Resolves a route from `from` to `to` and prints it.
pub async fn run(runner: &CliRunner, from: Coordinate, to: Coordinate) -> Result<(), CliError> {
    let gateway = build_gateway(runner.config())?;

    println!("Resolving route:");
    println!("  From:     {}", from);
    println!("  To:       {}", to);
    println!("  Provider: {}", gateway.provider_name());
    println!();

    match gateway.resolve_route(from, to).await? {
        RouteResolution::NoRouteNeeded => {
            println!("Endpoints are within {} m; no route needed.", gateway.config().min_route_distance_m);
        }
        RouteResolution::Resolved(path) => {
            println!("Points: {}", path.len());
            println!("Length: {:.0} m", path.total_length());
            println!();
            for (i, point) in path.points().iter().enumerate() {
                println!("  {:>4}  {}", i, point);
            }
        }
    }

    Ok(())
}
