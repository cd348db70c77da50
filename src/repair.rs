//! One-shot repair policy around the batch evaluator.
//!
//! When a program fails at any stage, its source is sent with a fixed
//! instructional prompt to a text-completion service. The answer replaces the
//! source and is run once more; a second failure is final.

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::config::Config;
use crate::interpreter::run_to_string;
use crate::parser::parse;

/// Text-completion service that answers a prompt with replacement source.
pub trait RepairService {
    fn repair(&self, prompt: &str) -> Result<String>;
}

impl<F> RepairService for F
where
    F: Fn(&str) -> Result<String>,
{
    fn repair(&self, prompt: &str) -> Result<String> {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairOutcome {
    pub output: String,
    /// Source that produced `output` when the original had to be replaced.
    pub repaired_source: Option<String>,
}

const PROMPT_HEAD: &str = "\
Esti un asistent care ajuta elevii de liceu sa ruleze pseudocod.
Reformateaza codul doar daca are erori de sintaxa. Nu modifica logica si nu inlocui expresii valide cu alternative.
Raspunde doar cu codul refacut, fara explicatii, comentarii sau markdown.
Daca un bloc este indentat, cuprinde toate liniile indentate intre acolade.
---
EXEMPLE:
a = 5
b <- 3.14
citeste a, b, c
scrie \"a = \", a
x = [x / 10]
n <- not 0 si 1
daca x % 2 = 0 atunci scrie x, \" e par\"
altfel scrie x, \" e impar\"
daca x < 0 {
    scrie \"Negativ\"
    x = -x
}
pentru i = 1, 10 executa scrie i, \" \"
pentru i = 5, -5, -1 {
    scrie i
}
pentru i = 0, i < n, i = i + 2 executa
    x = x + 1
cat timp n != 0 executa cnt = cnt + 1; n = [n / 10]
repeta scrie x, \" \"; x = x - 1 pana cand x = 0
---
Codul utilizatorului:
";

const PROMPT_TAIL: &str = "
---
Returneaza codul complet, fara nimic in plus, gata sa fie interpretat.";

/// Fixed instructional prompt wrapped around `source`.
pub fn repair_prompt(source: &str) -> String {
    format!("{PROMPT_HEAD}{source}{PROMPT_TAIL}")
}

fn run_source(source: &str, input: &[String], config: &Config) -> Result<String> {
    let program = parse(source)?;
    Ok(run_to_string(&program, input, config)?)
}

/// Runs `source`, falling back once to a repaired version of it.
pub fn run_with_repair(
    source: &str,
    service: &dyn RepairService,
    input: &[String],
    config: &Config,
) -> Result<RepairOutcome> {
    let error = match run_source(source, input, config) {
        Ok(output) => {
            return Ok(RepairOutcome {
                output,
                repaired_source: None,
            });
        }
        Err(error) => error,
    };
    warn!(%error, "program failed, requesting a repaired version");

    let replacement = service
        .repair(&repair_prompt(source))
        .context("Requesting repaired source")?
        .trim()
        .to_string();
    match run_source(&replacement, input, config) {
        Ok(output) => {
            info!("repaired program ran successfully");
            Ok(RepairOutcome {
                output,
                repaired_source: Some(replacement),
            })
        }
        Err(error) => bail!("{error} \n Cod refacut: {replacement}"),
    }
}
