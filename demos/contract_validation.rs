//! Contract checking, error dispatch and required-test enforcement.
//!
//! Demonstrates:
//! - declaring a contract over record types
//! - reading every mismatched argument from a violation
//! - recovering from violations with a handler map loaded from JSON
//! - reporting functions whose required tests are missing

use specwright::contract::{Args, Callable, Contract, ContractViolation};
use specwright::core::{builtin, Fault, Record, TypeRegistry, Value};
use specwright::dispatch::{Dispatch, ErrorRegistry, HandlerConfig, MemorySink};
use specwright::testing::{EnforcementLevel, TestPlan, TestRegistry};
use tracing_subscriber::EnvFilter;

const HANDLERS: &str = r#"[
    { "error": "InputValidationError", "strategy": "log" },
    { "error": "QuotaExceeded", "strategy": { "value": "try again tomorrow" } }
]"#;

fn main() -> Result<(), Fault> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Contract Validation ===\n");

    let types = TypeRegistry::new()
        .define_record("User", [("name", "str"), ("age", "int"), ("email", "Optional[str]")])
        .map_err(|e| Fault::from_error(builtin::spec_error(), e))?;

    let quota = builtin::exception().subtype("QuotaExceeded");
    let raised = quota.clone();
    let mut tests = TestRegistry::new();

    let greet = Contract::new("greet")
        .qualname("users.greet")
        .module("users")
        .doc("Build a greeting for a user, repeated `times` times.")
        .param("user", "User")
        .param_default("times", "int", 1_i64)
        .returns("str")
        .types(&types)
        .requires_tests(TestPlan::new().edge_case("zero_times").error_case("missing_name"))
        .wrap(move |args| {
            let times = args.int("times")?;
            if times > 3 {
                return Err(Fault::new(raised.clone(), "greeting quota exceeded"));
            }
            let name = args
                .require("user")?
                .as_record()
                .and_then(|user| user.get("name"))
                .and_then(Value::as_str)
                .unwrap_or("stranger");
            let greeting = format!("Hello, {name}! ");
            Ok(Value::from(greeting.repeat(times.max(0) as usize).trim_end().to_string()))
        })?;
    greet.register_tests(&mut tests);

    println!("Signature: {}", greet.metadata().signature());

    let ada = Record::new("User").with("name", "Ada").with("age", 36_i64);
    println!("\nWell-typed call:");
    println!("  {}", greet.call(Args::new().arg(ada.clone()).kwarg("times", 2_i64))?);

    println!("\nIll-typed call:");
    let bad_user = Record::new("User").with("name", 7_i64).with("age", "old");
    if let Err(fault) = greet.call(Args::new().arg(bad_user).kwarg("times", "twice")) {
        if let Some(violation) = fault.cause::<ContractViolation>() {
            println!("  {violation}");
            println!("  offending parameters: {:?}", violation.parameters());
        }
    }

    println!("\nDispatching through handlers loaded from JSON:");
    let registry = ErrorRegistry::with_builtins().declare(quota);
    let handlers = HandlerConfig::from_json(HANDLERS)?.resolve(&registry)?;
    let sink = MemorySink::new();
    let guarded = Dispatch::wrap(handlers, greet).with_sink(sink.clone());

    let answer = guarded.call(Args::new().arg(ada).kwarg("times", 5_i64))?;
    println!("  quota exceeded -> {answer}");

    let logged = guarded.call(Args::new().arg("not a user"));
    println!("  bad input re-raised: {}", logged.is_err());
    for record in sink.records() {
        println!("  logged from {}: {}", record.qualname, record.fault.error_type());
    }

    println!("\nRequired tests:");
    let collected = ["test_greet_happy_path", "test_greet_zero_times"];
    if let Some(report) = tests.report(collected) {
        println!("{report}");
    }
    tests.enforce(EnforcementLevel::Warn, collected)?;
    if let Err(err) = tests.enforce(EnforcementLevel::Strict, collected) {
        println!("Strict enforcement fails with {} missing function(s)", err.missing.len());
    }

    Ok(())
}
