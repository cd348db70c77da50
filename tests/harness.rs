use anyhow::{Context, Result, ensure};
use std::path::Path;

use pretty_assertions::assert_eq;
use pseudocod::backend::Backend;
use pseudocod::backend::debugger::DebuggerBackend;
use pseudocod::backend::interpreter::Interpreter;
use pseudocod::{parser, transpiler};
use test_support::{
    Case, CaseClass, is_backend_unsupported, load_cases, normalize_output,
    validate_unsupported_backends,
};

const KNOWN_BACKENDS: [&str; 3] = ["interpreter", "debugger", "transpiler"];

fn check_case(backend: &dyn Backend, case: &Case) -> Result<()> {
    let source = case.read_program()?;
    let parsed = parser::parse(&source);
    match case.spec.class {
        CaseClass::RuntimeSuccess => {
            ensure!(
                case.spec.expected.exit_code == 0,
                "Case {} expected exit code must be 0 for runtime_success",
                case.name
            );
            let stdout_file = case
                .spec
                .expected
                .stdout_file
                .as_deref()
                .with_context(|| format!("Missing stdout_file in {}", case.name))?;
            let expected = case.read_text(stdout_file)?;
            let program = parsed.with_context(|| format!("Parsing {}", case.name))?;
            let output = backend
                .run(&program)
                .with_context(|| format!("Backend {} failed for {}", backend.name(), case.name))?;
            assert_eq!(
                normalize_output(&output),
                normalize_output(&expected),
                "Backend {} mismatch for {}",
                backend.name(),
                case.name
            );
        }
        CaseClass::FrontendError => {
            ensure!(
                case.spec.expected.exit_code == 1,
                "Case {} expected exit code must be 1 for frontend_error",
                case.name
            );
            let expected_error = case.expected_error()?;
            let Err(error) = parsed else {
                anyhow::bail!("Expected frontend error in {}, but parsing succeeded", case.name);
            };
            let actual = error.to_string();
            ensure!(
                actual.contains(&expected_error),
                "Expected frontend error containing '{expected_error}' in {}, got '{actual}'",
                case.name
            );
        }
        CaseClass::BackendRuntimeError => {
            ensure!(
                case.spec.expected.exit_code == 1,
                "Case {} expected exit code must be 1 for backend_runtime_error",
                case.name
            );
            let expected_error = case.expected_error()?;
            let program = parsed.with_context(|| format!("Parsing {}", case.name))?;
            let Err(error) = backend.run(&program) else {
                anyhow::bail!(
                    "Expected backend runtime error for backend {} in {}",
                    backend.name(),
                    case.name
                );
            };
            let actual = error.to_string();
            ensure!(
                actual.contains(&expected_error),
                "Expected backend runtime error containing '{expected_error}' in {}, got '{actual}'",
                case.name
            );
        }
    }
    Ok(())
}

fn run_programs_for_backend(backend_for: impl Fn(&Case) -> Box<dyn Backend>) -> Result<()> {
    let cases = load_cases(Path::new("tests/programs"))?;

    for case in cases {
        validate_unsupported_backends(&case, &KNOWN_BACKENDS)?;
        let backend = backend_for(&case);
        if is_backend_unsupported(&case, backend.name()) {
            continue;
        }
        if case.spec.bench.enabled {
            ensure!(
                !case.spec.bench.tags.is_empty(),
                "Case {} has bench enabled but no tags",
                case.name
            );
        }
        check_case(backend.as_ref(), &case)?;
    }

    Ok(())
}

#[test]
fn runs_programs_interpreter_backend() -> Result<()> {
    run_programs_for_backend(|case| {
        Box::new(Interpreter::new().with_input(case.spec.input.clone()))
    })
}

#[test]
fn runs_programs_debugger_backend() -> Result<()> {
    run_programs_for_backend(|case| {
        Box::new(DebuggerBackend::new().with_input(case.spec.input.clone()))
    })
}

#[test]
fn transpiles_programs() -> Result<()> {
    let cases = load_cases(Path::new("tests/programs"))?;
    let mut compared = 0;

    for case in cases {
        if is_backend_unsupported(&case, "transpiler") {
            continue;
        }
        let Some(cpp_file) = case.spec.expected.cpp_file.as_deref() else {
            continue;
        };
        let expected = case.read_text(cpp_file)?;
        let actual = transpiler::transpile_source(&case.read_program()?)
            .with_context(|| format!("Transpiling {}", case.name))?;
        assert_eq!(actual, expected, "Transpiler mismatch for {}", case.name);
        compared += 1;
    }

    ensure!(compared > 0, "No transpiler fixtures found");
    Ok(())
}
