//! Command-line interface for inspecting `UnityFS` archives and the
//! serialized files they contain.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use unity_asset_binary::asset::SerializedFileOptions;
use unity_asset_binary::{AssetBundle, SerializedFile};

#[derive(Parser)]
#[command(name = "unity-asset")]
#[command(about = "Inspect UnityFS archives and serialized files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode and print every object's fields.
    Dump {
        /// Archive or standalone serialized file.
        file: PathBuf,
    },
    /// List the classes this file's type trees describe.
    Type {
        file: PathBuf,
    },
    /// Decode every object and write each one to its own file.
    Save {
        file: PathBuf,
        /// Output directory (created if missing).
        #[arg(short, long, default_value = "__export")]
        output: PathBuf,
        /// Only export these persistent type ids.
        #[arg(short, long)]
        types: Vec<i32>,
    },
}

/// One serialized file found inside an archive, or the whole input file
/// when it isn't an archive at all.
struct Entry {
    name: String,
    data: Vec<u8>,
}

fn load_entries(path: &Path) -> Result<Vec<Entry>> {
    let raw = fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    match AssetBundle::parse(&raw) {
        Ok(bundle) => {
            let entries = bundle
                .serialized_file_nodes()
                .map(|node| Entry {
                    name: node.path.clone(),
                    data: bundle.node_data(node).to_vec(),
                })
                .collect();
            Ok(entries)
        }
        Err(_) => Ok(vec![Entry {
            name: path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "input".to_string()),
            data: raw,
        }]),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Dump { file } => dump(&file),
        Commands::Type { file } => list_types(&file),
        Commands::Save {
            file,
            output,
            types,
        } => save(&file, &output, &types),
    }
}

fn dump(file: &Path) -> Result<()> {
    for entry in load_entries(file)? {
        println!(">>> {}", entry.name);
        let serialized = SerializedFile::parse(&entry.data)?;
        let options = SerializedFileOptions::default();
        for obj in &serialized.objects {
            match serialized.deserialize_object(&entry.data, obj, &options) {
                Ok(value) => println!("{} {:#?}", obj.local_identifier_in_file, value),
                Err(err) => eprintln!("[skip] object {}: {err}", obj.local_identifier_in_file),
            }
        }
    }
    Ok(())
}

fn list_types(file: &Path) -> Result<()> {
    for entry in load_entries(file)? {
        println!(">>> {}", entry.name);
        let serialized = SerializedFile::parse(&entry.data)?;
        for tree in &serialized.type_trees {
            let class_name = tree.root().map(|c| c.name.as_str()).unwrap_or("<no type tree>");
            println!(
                "{:3} {:<24} script_type_index={}",
                tree.persistent_type_id, class_name, tree.script_type_index
            );
        }
    }
    Ok(())
}

fn save(file: &Path, output: &Path, types: &[i32]) -> Result<()> {
    for entry in load_entries(file)? {
        let serialized = SerializedFile::parse(&entry.data)?;
        let options = SerializedFileOptions::default();
        let entry_dir = output.join(&entry.name);
        fs::create_dir_all(&entry_dir)?;

        for obj in &serialized.objects {
            let tree = &serialized.type_trees[obj.type_id as usize];
            if !types.is_empty() && !types.contains(&tree.persistent_type_id) {
                continue;
            }
            match serialized.deserialize_object(&entry.data, obj, &options) {
                Ok(value) => {
                    let class_name = tree.root().map(|c| c.name.as_str()).unwrap_or("Unknown");
                    let out_path = entry_dir.join(format!(
                        "{}_{}.txt",
                        obj.local_identifier_in_file, class_name
                    ));
                    fs::write(&out_path, format!("{value:#?}"))?;
                    println!("# {}", out_path.display());
                }
                Err(err) => eprintln!("[skip] object {}: {err}", obj.local_identifier_in_file),
            }
        }
    }
    Ok(())
}
