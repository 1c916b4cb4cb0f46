// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: keg directory
fn keg_arg() -> Arg {
    Arg::new("keg")
        .required(true)
        .value_name("KEG")
        .help("Keg directory, e.g. <cellar>/foo/1.0")
}

/// Common argument: package name override
fn name_arg() -> Arg {
    Arg::new("name")
        .long("name")
        .value_name("NAME")
        .help("Package name (default: the keg's parent directory name)")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print changed files as JSON")
}

fn build_cli() -> Command {
    Command::new("keg-relocate")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Conary Contributors")
        .about("Make installed package kegs relocatable")
        .subcommand_required(true)
        .arg(Arg::new("config").long("config").value_name("PATH").help("Config file"))
        .arg(Arg::new("prefix").long("prefix").value_name("PATH").help("Install prefix"))
        .arg(
            Arg::new("cellar")
                .long("cellar")
                .value_name("PATH")
                .help("Cellar holding installed kegs (default: <prefix>/Cellar)"),
        )
        .arg(
            Arg::new("repository")
                .long("repository")
                .value_name("PATH")
                .help("Package manager repository checkout"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(
            Command::new("freeze")
                .about("Replace install locations with placeholders before packaging")
                .arg(keg_arg())
                .arg(name_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("thaw")
                .about("Replace placeholders with install locations after unpacking")
                .arg(keg_arg())
                .arg(
                    Arg::new("files")
                        .num_args(0..)
                        .value_name("FILES")
                        .help("Only rewrite these files (relative to the keg)"),
                )
                .arg(name_arg())
                .arg(
                    Arg::new("skip_linkage")
                        .long("skip-linkage")
                        .action(ArgAction::SetTrue)
                        .help("Skip the dynamic linkage step"),
                )
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("relativize")
                .about("Rewrite absolute symlinks into the prefix or cellar as relative links")
                .arg(keg_arg())
                .arg(name_arg()),
        )
        .subcommand(
            Command::new("text-files")
                .about("List files that would be considered for substitution")
                .arg(keg_arg())
                .arg(name_arg()),
        )
        .subcommand(
            Command::new("grep")
                .about("List unique files in a keg containing a literal string")
                .arg(keg_arg())
                .arg(Arg::new("needle").required(true).help("String to search for"))
                .arg(name_arg()),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory - use CARGO_MANIFEST_DIR which is always set by cargo
    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("keg-relocate.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
