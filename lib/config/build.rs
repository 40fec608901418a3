use std::{collections::BTreeMap, env, fs, path::PathBuf};

const DEFAULT_BOARD: &str = "stm3210e-eval";

fn parse_value(key: &str, value: &str) -> usize {
    let clean = value.trim().replace('_', "");
    let parsed = match clean.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => clean.parse::<usize>(),
    };
    parsed.unwrap_or_else(|err| panic!("Invalid value '{}' for flag {}: {}", value, key, err))
}

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let board = env::var("BOARD").unwrap_or_else(|_| String::from(DEFAULT_BOARD));
    let boards_path = PathBuf::from(manifest_dir).join("../../boards.json");
    let boards_str = fs::read_to_string(&boards_path).unwrap();
    let boardmap: BTreeMap<String, BTreeMap<String, String>> =
        serde_json::from_str(&boards_str).unwrap();
    let flags = match boardmap.get(board.as_str()) {
        Some(value) => value,
        None => panic!("Unknown board '{}'.", board),
    };
    make_flags(&board, flags);
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../../boards.json");
    println!("cargo:rerun-if-env-changed=BOARD");
}

fn make_flags(board: &str, flagmap: &BTreeMap<String, String>) {
    let mut s = String::new();
    s += "/// Name of the board these flags were generated for.\n";
    s += format!("pub const BOARD_NAME: &str = {:?};\n", board).as_str();
    for (key, value) in flagmap {
        s += format!("/// Board flag `{}`.\n", key).as_str();
        s += format!("pub const {}: usize = {};\n", key, parse_value(key, value)).as_str();
    }
    let out_dir = env::var("OUT_DIR").unwrap();
    let path = PathBuf::from(out_dir).join("build_flags.rs");
    fs::write(path, s).unwrap();
}
