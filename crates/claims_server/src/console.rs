//! # Operator Console
//!
//! Line-based administration on stdin. Each line is split on whitespace and
//! parsed with a `clap` command, then run against the [`RegionService`] as the
//! player it names.
//!
//! ```text
//! claim alice home overworld 10 64 10 --size 21
//! flag alice home can_open_chests true
//! member add alice home bob
//! check bob overworld 12 64 12 --action place
//! ```

use claims_core::{auth, BlockPos, BoundsPatch, FlagKind, FlagsPatch, Permission, Region};
use clap::{value_parser, Arg, ArgMatches, Command};
use plugin_claims::{ClaimRequest, Location, RegionService, ServiceError};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Claim(ClaimRequest),
    Delete {
        actor: String,
        name: String,
    },
    Flag {
        actor: String,
        name: String,
        flag: FlagKind,
        value: bool,
    },
    Resize {
        actor: String,
        name: String,
        patch: BoundsPatch,
    },
    MemberAdd {
        actor: String,
        name: String,
        player: String,
    },
    MemberRemove {
        actor: String,
        name: String,
        player: String,
    },
    List {
        owner: String,
    },
    Info {
        name: String,
    },
    Check {
        player: String,
        world: String,
        position: BlockPos,
        permission: Permission,
    },
    Stats,
    Help,
}

const RESIZE_FIELDS: [&str; 6] = ["min-x", "min-y", "min-z", "max-x", "max-y", "max-z"];

fn text(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).required(true).help(help)
}

fn coord(name: &'static str) -> Arg {
    Arg::new(name)
        .required(true)
        .allow_negative_numbers(true)
        .value_parser(value_parser!(i32))
}

fn console_command() -> Command {
    let mut resize = Command::new("resize")
        .about("Move the faces of a region")
        .arg(text("player", "Acting owner"))
        .arg(text("name", "Region name"));
    for field in RESIZE_FIELDS {
        resize = resize.arg(
            Arg::new(field)
                .long(field)
                .value_name("BLOCK")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i32)),
        );
    }

    Command::new("console")
        .no_binary_name(true)
        .subcommand_required(true)
        .disable_help_subcommand(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .subcommand(
            Command::new("claim")
                .about("Claim a cube around a location")
                .arg(text("player", "Owner of the new claim"))
                .arg(text("name", "Region name"))
                .arg(text("world", "World name"))
                .arg(coord_f64("x"))
                .arg(coord_f64("y"))
                .arg(coord_f64("z"))
                .arg(
                    Arg::new("size")
                        .long("size")
                        .value_name("BLOCKS")
                        .value_parser(value_parser!(u32))
                        .help("Edge length, odd"),
                ),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a region")
                .arg(text("player", "Acting owner"))
                .arg(text("name", "Region name")),
        )
        .subcommand(
            Command::new("flag")
                .about("Set a region flag")
                .arg(text("player", "Acting owner"))
                .arg(text("name", "Region name"))
                .arg(text("flag", "Flag name"))
                .arg(
                    Arg::new("value")
                        .required(true)
                        .value_parser(value_parser!(bool)),
                ),
        )
        .subcommand(resize)
        .subcommand(
            Command::new("member")
                .about("Manage region members")
                .subcommand_required(true)
                .subcommand(
                    Command::new("add")
                        .arg(text("player", "Acting owner"))
                        .arg(text("name", "Region name"))
                        .arg(text("member", "Player to add")),
                )
                .subcommand(
                    Command::new("remove")
                        .arg(text("player", "Acting owner"))
                        .arg(text("name", "Region name"))
                        .arg(text("member", "Player to remove")),
                ),
        )
        .subcommand(
            Command::new("list")
                .about("List regions owned by a player")
                .arg(text("player", "Owner")),
        )
        .subcommand(
            Command::new("info")
                .about("Show a region")
                .arg(text("name", "Region name")),
        )
        .subcommand(
            Command::new("check")
                .about("Check whether a player may act at a block")
                .arg(text("player", "Acting player"))
                .arg(text("world", "World name"))
                .arg(coord("x"))
                .arg(coord("y"))
                .arg(coord("z"))
                .arg(
                    Arg::new("action")
                        .long("action")
                        .value_parser(["break", "place", "open"])
                        .default_value("break"),
                ),
        )
        .subcommand(Command::new("stats").about("Show cache statistics"))
        .subcommand(Command::new("help").about("Show this help"))
}

fn coord_f64(name: &'static str) -> Arg {
    Arg::new(name)
        .required(true)
        .allow_negative_numbers(true)
        .value_parser(value_parser!(f64))
}

fn arg(matches: &ArgMatches, name: &str) -> String {
    matches.get_one::<String>(name).cloned().unwrap_or_default()
}

fn num<T: Copy + Send + Sync + 'static>(matches: &ArgMatches, name: &str) -> Option<T> {
    matches.get_one::<T>(name).copied()
}

/// Parses one console line.
pub fn parse_line(line: &str) -> Result<ConsoleCommand, String> {
    let matches = console_command()
        .try_get_matches_from(line.split_whitespace())
        .map_err(|e| e.to_string().trim_end().to_string())?;

    let command = match matches.subcommand() {
        Some(("claim", m)) => ConsoleCommand::Claim(ClaimRequest {
            owner: arg(m, "player"),
            world: arg(m, "world"),
            location: Location::new(
                num(m, "x").unwrap_or_default(),
                num(m, "y").unwrap_or_default(),
                num(m, "z").unwrap_or_default(),
            ),
            name: arg(m, "name"),
            size: num(m, "size"),
        }),
        Some(("delete", m)) => ConsoleCommand::Delete {
            actor: arg(m, "player"),
            name: arg(m, "name"),
        },
        Some(("flag", m)) => ConsoleCommand::Flag {
            actor: arg(m, "player"),
            name: arg(m, "name"),
            flag: arg(m, "flag").parse().map_err(|e| format!("{e}"))?,
            value: num(m, "value").unwrap_or_default(),
        },
        Some(("resize", m)) => {
            let patch = BoundsPatch {
                min_x: num(m, "min-x"),
                min_y: num(m, "min-y"),
                min_z: num(m, "min-z"),
                max_x: num(m, "max-x"),
                max_y: num(m, "max-y"),
                max_z: num(m, "max-z"),
            };
            if patch.is_empty() {
                return Err("resize needs at least one of --min-x .. --max-z".to_string());
            }
            ConsoleCommand::Resize {
                actor: arg(m, "player"),
                name: arg(m, "name"),
                patch,
            }
        }
        Some(("member", m)) => match m.subcommand() {
            Some(("add", m)) => ConsoleCommand::MemberAdd {
                actor: arg(m, "player"),
                name: arg(m, "name"),
                player: arg(m, "member"),
            },
            Some(("remove", m)) => ConsoleCommand::MemberRemove {
                actor: arg(m, "player"),
                name: arg(m, "name"),
                player: arg(m, "member"),
            },
            _ => return Err("usage: member <add|remove> <player> <name> <member>".to_string()),
        },
        Some(("list", m)) => ConsoleCommand::List {
            owner: arg(m, "player"),
        },
        Some(("info", m)) => ConsoleCommand::Info {
            name: arg(m, "name"),
        },
        Some(("check", m)) => ConsoleCommand::Check {
            player: arg(m, "player"),
            world: arg(m, "world"),
            position: BlockPos::new(
                num(m, "x").unwrap_or_default(),
                num(m, "y").unwrap_or_default(),
                num(m, "z").unwrap_or_default(),
            ),
            permission: match arg(m, "action").as_str() {
                "place" => Permission::Place,
                "open" => Permission::OpenContainers,
                _ => Permission::Break,
            },
        },
        Some(("stats", _)) => ConsoleCommand::Stats,
        Some(("help", _)) => ConsoleCommand::Help,
        _ => return Err("unknown command, try 'help'".to_string()),
    };
    Ok(command)
}

/// Console usage text.
pub fn help_text() -> String {
    console_command().render_long_help().to_string()
}

/// Runs a command and renders its outcome.
pub async fn execute(service: &RegionService, command: ConsoleCommand) -> Result<String, ServiceError> {
    let output = match command {
        ConsoleCommand::Claim(request) => {
            let region = service.create_claim(request).await?;
            format!("Claimed '{}' ({})", region.name, region.id)
        }
        ConsoleCommand::Delete { actor, name } => {
            let region = service.delete_region(&actor, &name).await?;
            format!("Deleted '{}'", region.name)
        }
        ConsoleCommand::Flag {
            actor,
            name,
            flag,
            value,
        } => {
            let mut patch = FlagsPatch::default();
            patch.set_kind(flag, value);
            if service.update_flags(&actor, &name, &patch).await? {
                format!("Set {flag} = {value} on '{name}'")
            } else {
                format!("'{name}' has no flags to update")
            }
        }
        ConsoleCommand::Resize { actor, name, patch } => {
            let bounds = service.update_bounds(&actor, &name, &patch).await?;
            format!("Resized '{}' to {} .. {}", name, bounds.min(), bounds.max())
        }
        ConsoleCommand::MemberAdd { actor, name, player } => {
            let member = service.add_member(&actor, &name, &player).await?;
            format!("{} is a member of '{}'", member.player_name, name)
        }
        ConsoleCommand::MemberRemove { actor, name, player } => {
            if service.remove_member(&actor, &name, &player).await? {
                format!("Removed {player} from '{name}'")
            } else {
                format!("{player} is not a member of '{name}'")
            }
        }
        ConsoleCommand::List { owner } => {
            let regions = service.regions_owned_by(&owner).await;
            if regions.is_empty() {
                format!("{owner} owns no regions")
            } else {
                let names: Vec<&str> = regions.iter().map(|r| r.name.as_str()).collect();
                format!("{owner} owns {}: {}", regions.len(), names.join(", "))
            }
        }
        ConsoleCommand::Info { name } => match service.region_info(&name).await {
            Some(region) => describe(&region),
            None => return Err(ServiceError::RegionNotFound(name)),
        },
        ConsoleCommand::Check {
            player,
            world,
            position,
            permission,
        } => {
            let shared = service.cache();
            let cache = shared.read().await;
            match cache.region_at(&world, position) {
                None => format!("{position} in {world} is unclaimed"),
                Some(region) if auth::is_allowed(&cache, region, &player, permission) => {
                    format!("{permission:?} allowed for {player} in '{}'", region.name)
                }
                Some(region) => {
                    format!("{permission:?} denied for {player} by '{}'", region.name)
                }
            }
        }
        ConsoleCommand::Stats => {
            let stats = service.stats().await;
            format!(
                "{} regions ({} indexed), {} memberships, {} queries, {} insertions, {} removals",
                stats.regions,
                stats.bounded_regions,
                stats.memberships,
                stats.index.total_queries,
                stats.index.total_insertions,
                stats.index.total_removals
            )
        }
        ConsoleCommand::Help => help_text(),
    };
    Ok(output)
}

fn describe(region: &Region) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Region '{}' ({})", region.name, region.id);
    let _ = writeln!(out, "  owner: {}", region.owner);
    let _ = writeln!(out, "  world: {}", region.world);
    match region.bounds {
        Some(bounds) => {
            let _ = writeln!(
                out,
                "  bounds: {} .. {} (center {})",
                bounds.min(),
                bounds.max(),
                bounds.center
            );
        }
        None => {
            let _ = writeln!(out, "  bounds: none");
        }
    }
    if let Some(flags) = region.flags {
        let rendered: Vec<String> = FlagKind::ALL
            .iter()
            .map(|kind| format!("{kind}={}", flags.get(*kind)))
            .collect();
        let _ = writeln!(out, "  flags: {}", rendered.join(" "));
    }
    let members: Vec<&str> = region.members.iter().map(|m| m.player_name.as_str()).collect();
    let _ = write!(
        out,
        "  members: {}",
        if members.is_empty() {
            "none".to_string()
        } else {
            members.join(", ")
        }
    );
    out
}

/// Reads commands from stdin until it closes.
pub async fn run_console(service: Arc<RegionService>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("⌨️ Operator console ready, type 'help' for commands");

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("⌨️ Console input closed");
                break;
            }
            Err(e) => {
                warn!("⌨️ Console read error: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_line(&line) {
            Ok(command) => match execute(&service, command).await {
                Ok(output) => info!("⌨️ {}", output),
                Err(e) => warn!("⌨️ {}", e),
            },
            Err(e) => warn!("⌨️ {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims_store::MemoryRegionStore;
    use plugin_claims::ClaimRules;

    async fn service() -> RegionService {
        let service = RegionService::new(Arc::new(MemoryRegionStore::new()), ClaimRules::default());
        service.load().await.unwrap();
        service
    }

    async fn run(service: &RegionService, line: &str) -> Result<String, ServiceError> {
        execute(service, parse_line(line).unwrap()).await
    }

    #[test]
    fn test_parse_claim() {
        let command = parse_line("claim alice home overworld 10.5 64 -3 --size 11").unwrap();
        assert_eq!(
            command,
            ConsoleCommand::Claim(ClaimRequest {
                owner: "alice".to_string(),
                world: "overworld".to_string(),
                location: Location::new(10.5, 64.0, -3.0),
                name: "home".to_string(),
                size: Some(11),
            })
        );

        match parse_line("claim alice home overworld 0 0 0").unwrap() {
            ConsoleCommand::Claim(request) => assert_eq!(request.size, None),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_flag_and_member() {
        assert_eq!(
            parse_line("flag alice home PVP_ENABLED false").unwrap(),
            ConsoleCommand::Flag {
                actor: "alice".to_string(),
                name: "home".to_string(),
                flag: FlagKind::PvpEnabled,
                value: false,
            }
        );
        assert_eq!(
            parse_line("member remove alice home bob").unwrap(),
            ConsoleCommand::MemberRemove {
                actor: "alice".to_string(),
                name: "home".to_string(),
                player: "bob".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_resize_and_check() {
        match parse_line("resize alice home --min-y -10 --max-x 40").unwrap() {
            ConsoleCommand::Resize { patch, .. } => {
                assert_eq!(patch.min_y, Some(-10));
                assert_eq!(patch.max_x, Some(40));
                assert_eq!(patch.min_x, None);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert_eq!(
            parse_line("check bob overworld 1 -2 3 --action open").unwrap(),
            ConsoleCommand::Check {
                player: "bob".to_string(),
                world: "overworld".to_string(),
                position: BlockPos::new(1, -2, 3),
                permission: Permission::OpenContainers,
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("teleport alice").is_err());
        assert!(parse_line("flag alice home can_fly true").is_err());
        assert!(parse_line("flag alice home can_break maybe").is_err());
        assert!(parse_line("resize alice home").is_err());
        assert!(parse_line("claim alice home overworld x 64 0").is_err());
        assert!(parse_line("member alice home bob").is_err());
    }

    #[tokio::test]
    async fn test_console_session() {
        let service = service().await;

        let out = run(&service, "claim alice home overworld 5 65 5 --size 11").await.unwrap();
        assert!(out.contains("'home'"));

        let out = run(&service, "check bob overworld 5 65 5 --action place").await.unwrap();
        assert!(out.contains("denied"));

        run(&service, "member add alice home bob").await.unwrap();
        let out = run(&service, "check bob overworld 5 65 5 --action place").await.unwrap();
        assert!(out.contains("allowed"));

        let out = run(&service, "check bob overworld 500 65 5").await.unwrap();
        assert!(out.contains("unclaimed"));

        run(&service, "flag alice home explosions true").await.unwrap();
        let info = run(&service, "info home").await.unwrap();
        assert!(info.contains("explosions=true"));
        assert!(info.contains("members: bob"));
        assert!(info.contains("center (5, 65, 5)"));

        let out = run(&service, "list alice").await.unwrap();
        assert_eq!(out, "alice owns 1: home");

        let err = run(&service, "delete bob home").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotOwner { .. }));

        run(&service, "delete alice home").await.unwrap();
        assert!(matches!(
            run(&service, "info home").await,
            Err(ServiceError::RegionNotFound(_))
        ));
        assert!(run(&service, "stats").await.unwrap().starts_with("0 regions"));
    }

    #[tokio::test]
    async fn test_console_rejects_broken_geometry() {
        let service = service().await;

        for line in [
            "claim alice a overworld NaN 64 NaN --size 11",
            "claim alice b overworld inf 64 0 --size 11",
        ] {
            let err = run(&service, line).await.unwrap_err();
            assert!(matches!(
                err,
                ServiceError::Claim(claims_core::ClaimError::InvalidLocation(_))
            ));
        }

        run(&service, "claim alice home overworld 5.5 64 5.5 --size 11").await.unwrap();
        let err = run(&service, "resize alice home --min-x 20 --max-x 30").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidBounds(_)));
        assert!(run(&service, "stats").await.unwrap().starts_with("1 regions"));
    }

    #[test]
    fn test_help_lists_commands() {
        let help = help_text();
        for name in ["claim", "delete", "flag", "resize", "member", "list", "info", "check", "stats"] {
            assert!(help.contains(name), "help is missing {name}");
        }
    }
}
