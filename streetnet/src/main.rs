use clap::{Parser, Subcommand};
use std::path::Path;
use streetnet::algorithm::{routing, stats};
use streetnet::build::import_network;
use streetnet::config::{ImportOptions, Settings};
use streetnet::io;
use streetnet::model::graph::NodeId;
use streetnet::model::NetworkError;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct AppArguments {
    #[command(subcommand)]
    app: App,
}

#[derive(Subcommand)]
pub enum App {
    /// build a street network from a local elements file and save it as
    /// GraphML
    Import {
        #[arg(long, help = "path to an Overpass-style .json or map .xml/.osm elements file")]
        elements_file: String,
        #[arg(long, help = "path to a settings file (.toml or .json)")]
        settings_file: Option<String>,
        #[arg(long, help = "path to an import options file (.toml or .json)")]
        options_file: Option<String>,
        #[arg(long, help = "output path for the GraphML network")]
        output: String,
    },
    /// report morphometric stats for a saved network
    Stats {
        #[arg(long, help = "path to a GraphML network")]
        graph_file: String,
    },
    /// route between two nodes of a saved network
    Route {
        #[arg(long, help = "path to a GraphML network")]
        graph_file: String,
        #[arg(long, help = "origin node id")]
        origin: i64,
        #[arg(long, help = "destination node id")]
        destination: i64,
        #[arg(long, default_value = "length", help = "edge weight attribute")]
        weight: String,
        #[arg(long, default_value_t = 1, help = "number of shortest paths")]
        k: usize,
    },
}

pub fn run(app: &App) -> Result<(), NetworkError> {
    match app {
        App::Import {
            elements_file,
            settings_file,
            options_file,
            output,
        } => {
            let settings = match settings_file {
                None => Settings::default(),
                Some(f) => {
                    log::info!("reading settings from {f}");
                    Settings::try_from(f)?
                }
            };
            let options = match options_file {
                None => ImportOptions::default(),
                Some(f) => {
                    log::info!("reading import options from {f}");
                    ImportOptions::try_from(f)?
                }
            };

            let batch = if elements_file.ends_with(".json") {
                io::load_overpass_json(Path::new(elements_file))?
            } else if elements_file.ends_with(".xml") || elements_file.ends_with(".osm") {
                io::load_osm_xml(Path::new(elements_file))?
            } else {
                return Err(NetworkError::InvalidInput(format!(
                    "unsupported elements file type: {elements_file}"
                )));
            };

            let graph = import_network(&[batch], &settings, &options)?;
            io::save_graphml(&graph, Path::new(output))?;
            eprintln!(
                "saved network with {} nodes and {} edges to {output}",
                graph.n_nodes(),
                graph.n_edges()
            );
            Ok(())
        }
        App::Stats { graph_file } => {
            let graph = io::load_graphml(Path::new(graph_file), &io::CoercionTable::default())?;
            let summary = stats::graph_stats(&graph)?;
            let rendered = serde_json::to_string_pretty(&summary)
                .map_err(|e| NetworkError::JsonError(e.to_string()))?;
            println!("{rendered}");
            Ok(())
        }
        App::Route {
            graph_file,
            origin,
            destination,
            weight,
            k,
        } => {
            let graph = io::load_graphml(Path::new(graph_file), &io::CoercionTable::default())?;
            let origin = NodeId(*origin);
            let destination = NodeId(*destination);
            if *k <= 1 {
                let path = routing::shortest_path(&graph, origin, destination, weight)?;
                let cost = routing::path_cost(&graph, &path, weight).unwrap_or(f64::NAN);
                println!(
                    "{} ({weight} {cost:.1})",
                    path.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(" -> ")
                );
            } else {
                let paths = routing::k_shortest_paths(&graph, origin, destination, *k, weight)?;
                if paths.is_empty() {
                    return Err(NetworkError::NoPath {
                        origin,
                        destination,
                    });
                }
                for path in paths.iter() {
                    let cost = routing::path_cost(&graph, path, weight).unwrap_or(f64::NAN);
                    println!(
                        "{} ({weight} {cost:.1})",
                        path.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(" -> ")
                    );
                }
            }
            Ok(())
        }
    }
}

fn main() {
    env_logger::init();
    let args = AppArguments::parse();
    if let Err(e) = run(&args.app) {
        log::error!("streetnet failed: {e}");
        eprintln!("{e}");
        std::process::exit(1);
    }
}
