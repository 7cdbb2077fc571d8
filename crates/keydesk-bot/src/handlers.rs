//! Command handlers.

use crate::dispatcher::ActionDispatcher;
use crate::outcome::{Action, InboundEvent, Outcome};
use crate::presence::PresenceRotator;
use crate::render;
use console::style;

/// Dispatch one action as `actor` and print the outcome.
pub async fn dispatch(
    dispatcher: &ActionDispatcher,
    actor: &str,
    action: Action,
    json: bool,
) -> anyhow::Result<bool> {
    let outcome = dispatcher.dispatch(InboundEvent::new(actor, action)).await;
    print_outcome(&outcome, json)?;
    Ok(outcome.ok)
}

fn print_outcome(outcome: &Outcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    let text = render::message(outcome);
    if outcome.ok {
        println!("{} {}", style("✓").green(), text);
    } else {
        println!("{} {}", style("✗").red(), text);
    }

    if let Some(body) = render::embed(outcome) {
        println!("{}", style(serde_json::to_string_pretty(&body)?).dim());
    }
    Ok(())
}

/// Print the total execution count.
pub async fn executions(dispatcher: &ActionDispatcher, json: bool) -> anyhow::Result<()> {
    let count = dispatcher.licenses().execution_count().await?;
    if json {
        println!("{}", serde_json::json!({ "executionCount": count }));
    } else {
        println!("{} total executions", style(count).bold());
    }
    Ok(())
}

/// Print the next `ticks` presence statuses.
pub async fn presence(rotator: &mut PresenceRotator, ticks: usize, json: bool) -> anyhow::Result<()> {
    for _ in 0..ticks {
        let status = rotator.next_status().await;
        if json {
            println!("{}", serde_json::to_string(&status)?);
        } else {
            println!("{} {}", style(status.activity).cyan(), status.text);
        }
    }
    Ok(())
}
