//! Check command implementation.
//!
//! Reads a fixture file, builds the `ParseExpr` tree it describes, and runs
//! it through `kc_sem::analyse_expr`. Prints the resolved `Expr`/`Type` on
//! success; prints the collected diagnostics and returns an error
//! (translating to a non-zero exit code) on failure.

use std::path::PathBuf;
use std::time::Instant;

use kc_sem::{analyse_expr, Expr, ScopeChain, SemaError, TypeResolver};
use kc_util::diagnostic::Diagnostic;
use kc_util::Symbol;

use crate::commands::common::{error_messages, output_messages};
use crate::commands::traits::{Command, CommandDescription};
use crate::error::{DrvError, Result};
use crate::fixture::{build_struct_table, FixtureFile};
use crate::resolver::FixtureTypeResolver;

/// Arguments for the check subcommand.
#[derive(Debug, Clone)]
pub struct CheckArgs {
    pub verbose: bool,
    pub fixture: PathBuf,
}

/// Check command handler.
pub struct CheckCommand {
    args: CheckArgs,
}

impl CheckCommand {
    pub fn new(args: CheckArgs) -> Self {
        Self { args }
    }

    pub fn run(&self) -> Result<()> {
        let start_time = Instant::now();

        if !self.args.fixture.exists() {
            return Err(DrvError::Validation(format!(
                "{} {}",
                error_messages::FIXTURE_NOT_FOUND,
                self.args.fixture.display()
            )));
        }

        if self.args.verbose {
            eprintln!("{} {}", output_messages::ANALYZING, self.args.fixture.display());
        }

        let content = std::fs::read_to_string(&self.args.fixture)?;
        let fixture: FixtureFile = serde_json::from_str(&content)?;

        let expr = self.analyse(&fixture)?;

        println!("{:#?}", expr);
        println!("type: {:?}", expr.get_type());

        if self.args.verbose {
            eprintln!("✅ Checked in {:.2}s", start_time.elapsed().as_secs_f64());
        }

        Ok(())
    }

    fn analyse(&self, fixture: &FixtureFile) -> Result<Expr> {
        let structs = build_struct_table(&fixture.structs)?;
        let resolver = FixtureTypeResolver::new(structs);

        let mut scope = ScopeChain::new();
        for binding in &fixture.bindings {
            let ty = resolver
                .resolve(None, &binding.ty.to_type_expr())
                .map_err(DrvError::Analysis)?;
            scope.bind(Symbol::intern(&binding.name), Expr::Param { ty });
        }

        let expect = fixture
            .expect
            .as_ref()
            .map(|t| resolver.resolve(None, &t.to_type_expr()))
            .transpose()
            .map_err(DrvError::Analysis)?;

        let parse_expr = fixture.expr.build()?;

        analyse_expr(&mut scope, &resolver, expect, &parse_expr).map_err(|err| {
            self.report(&err);
            DrvError::Analysis(err)
        })
    }

    /// Print the analyser's diagnostics to stderr, one per `Multi` member.
    fn report(&self, err: &SemaError) {
        match err {
            SemaError::Multi(errors) => {
                for e in errors {
                    eprintln!("{}", render_diagnostic(&e.to_diagnostic()));
                }
            }
            other => eprintln!("{}", render_diagnostic(&other.to_diagnostic())),
        }
    }
}

/// Render a `Diagnostic` as a single human-readable line plus any notes and
/// help text, since this crate's fixtures carry no real source text for the
/// `Handler`'s snippet machinery to display against.
fn render_diagnostic(diagnostic: &Diagnostic) -> String {
    let mut out = format!("{}: {}", diagnostic.level, diagnostic.message);
    for note in &diagnostic.notes {
        out.push_str(&format!("\n  note: {}", note));
    }
    for help in &diagnostic.helps {
        out.push_str(&format!("\n  help: {}", help));
    }
    out
}

impl Command for CheckCommand {
    type Args = CheckArgs;
    type Output = ();

    fn new(args: Self::Args) -> Self {
        Self { args }
    }

    fn execute(&self) -> Result<Self::Output> {
        self.run()
    }

    fn name() -> &'static str {
        "check"
    }
}

impl CommandDescription for CheckCommand {
    fn description() -> &'static str {
        "Analyse a fixture expression"
    }

    fn help() -> &'static str {
        "Reads a fixture file describing a ParseExpr tree, runs it through \
         the semantic analyser, and prints the resolved expression and type \
         or the diagnostics explaining why it was rejected."
    }
}

/// Run the check command.
pub fn run_check(args: CheckArgs) -> Result<()> {
    CheckCommand::new(args).run()
}
