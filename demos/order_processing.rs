//! Order processing workflow.
//!
//! An order moves pending -> paid -> shipped. Payment runs through a
//! contract-checked charge function inside the guarded `pay` operation,
//! the `shipped` state notifies the customer on entry, and the workflow is
//! checkpointed and resumed halfway through.
//!
//! Run with `RUST_LOG=debug cargo run --example order_processing` to see
//! the transition log.

use specwright::contract::{Args, Callable, Contract, ContractFn};
use specwright::core::{builtin, Fault, Value};
use specwright::machine::{MachineBuilder, MachineDefinition, MachineInstance, Stateful, TransitionBuilder};
use specwright::Checkpoint;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Order {
    id: u64,
    total_cents: i64,
    charged_cents: i64,
    outbox: Vec<String>,
    machine: MachineInstance,
}

impl Stateful for Order {
    fn machine(&self) -> &MachineInstance {
        &self.machine
    }

    fn machine_mut(&mut self) -> &mut MachineInstance {
        &mut self.machine
    }
}

fn order_workflow() -> Result<MachineDefinition<Order>, Fault> {
    let workflow = MachineBuilder::new("Order")
        .states(["pending", "paid", "shipped"])
        .initial("pending")
        .track_history(true)
        .transition(TransitionBuilder::new("pay").from("pending").to("paid"))
        .transition(TransitionBuilder::new("ship").from("paid").to("shipped"))
        .on_exit("pending", |order: &mut Order| {
            println!("  [hook] order #{} leaves pending", order.id);
            Ok(())
        })
        .on_enter("shipped", |order: &mut Order| {
            order
                .outbox
                .push(format!("Order #{} is on its way", order.id));
            Ok(())
        })
        .build()?;
    Ok(workflow)
}

fn payment_gateway() -> Result<ContractFn, Fault> {
    let declined = builtin::exception().subtype("PaymentDeclined");
    let charge = Contract::new("charge")
        .qualname("PaymentGateway.charge")
        .module("shop.payments")
        .doc("Charge a card and return the captured amount in cents.")
        .param("card", "str")
        .param("amount", "int")
        .returns("int")
        .wrap(move |args| {
            let card = args.str("card")?;
            let amount = args.int("amount")?;
            if card.ends_with("0000") {
                return Err(Fault::new(declined.clone(), format!("card {card} declined")));
            }
            Ok(Value::Int(amount))
        })?;
    Ok(charge)
}

fn main() -> Result<(), Fault> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Order Processing Workflow ===\n");

    let workflow = order_workflow()?;
    let charge = payment_gateway()?;
    println!("Charge signature: {}", charge.metadata().signature());

    let mut order = Order {
        id: 1001,
        total_cents: 4_999,
        charged_cents: 0,
        outbox: Vec::new(),
        machine: workflow.instantiate(),
    };
    println!("Initial state: {}\n", order.state());

    println!("Shipping before payment...");
    match workflow.invoke(&mut order, "ship", |_| Ok(())) {
        Ok(()) => println!("  unexpected success"),
        Err(fault) => println!("  rejected: {}", fault.message()),
    }

    println!("\nPaying with a declined card...");
    let declined = workflow.invoke(&mut order, "pay", |order| {
        let args = Args::new().arg("4111-0000").arg(order.total_cents);
        charge.call(args).map(|_| ())
    });
    if let Err(fault) = declined {
        println!("  {}: {}", fault.error_type(), fault.message());
    }
    println!("  state is still: {}", order.state());

    println!("\nPaying with a valid card...");
    workflow.invoke(&mut order, "pay", |order| {
        let args = Args::new().arg("4111-1111").arg(order.total_cents);
        order.charged_cents = charge.call(args)?.as_int().unwrap_or_default();
        Ok(())
    })?;
    println!("  charged {} cents, state: {}", order.charged_cents, order.state());

    println!("\nCheckpointing the paid order...");
    let json = workflow.checkpoint(order.machine()).to_json()?;
    println!("{json}");

    let checkpoint = Checkpoint::from_json(&json)?;
    let mut resumed = Order {
        id: order.id,
        total_cents: order.total_cents,
        charged_cents: order.charged_cents,
        outbox: Vec::new(),
        machine: workflow.restore(&checkpoint)?,
    };
    println!("\nResumed order #{} in state: {}", resumed.id, resumed.state());

    workflow.invoke(&mut resumed, "ship", |_| Ok(()))?;
    println!("Shipped. Outbox:");
    for message in &resumed.outbox {
        println!("  - {message}");
    }

    println!("\nShipping twice...");
    if let Err(fault) = workflow.invoke(&mut resumed, "ship", |_| Ok(())) {
        println!("  rejected: {}", fault.message());
    }

    println!("\nHistory: {}", resumed.history().join(" -> "));
    for transition in resumed.machine().transitions() {
        println!(
            "  {} : {} -> {} at {}",
            transition.operation,
            transition.from,
            transition.to,
            transition.timestamp.format("%H:%M:%S%.3f")
        );
    }

    Ok(())
}
