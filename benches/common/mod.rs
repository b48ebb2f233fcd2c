#![allow(dead_code)]
use std::fs;

use rill::ast::Block;
use rill::{lexer, parser};

pub const WORKLOADS: [(&str, &str); 2] = [
    ("sum", "tests/programs/bench_sum/program.rill"),
    ("strings", "tests/programs/bench_strings/program.rill"),
];

pub fn load_source(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {path}: {err}"))
}

pub fn load_program(path: &str) -> Block {
    let source = load_source(path);
    let tokens = lexer::tokenize(&source).unwrap_or_else(|err| panic!("tokenize {path}: {err}"));
    parser::parse_tokens(tokens).unwrap_or_else(|err| panic!("parse {path}: {err}"))
}
