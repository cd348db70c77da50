#![allow(dead_code)]
use std::path::Path;

use pseudocod::ast::Program;
use pseudocod::parser;
use test_support::{Case, bench_cases};

/// Fixture cases with benchmarking enabled.
pub fn workloads() -> Vec<Case> {
    bench_cases(Path::new("tests/programs"), None)
        .unwrap_or_else(|err| panic!("load bench cases: {err:#}"))
}

pub fn load_source(case: &Case) -> String {
    case.read_program()
        .unwrap_or_else(|err| panic!("read {}: {err:#}", case.name))
}

pub fn load_program(case: &Case) -> Program {
    parser::parse(&load_source(case)).unwrap_or_else(|err| panic!("parse {}: {err}", case.name))
}
