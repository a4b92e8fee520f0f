//! Interactive CD player driven from stdin.
//!
//! ```text
//! cargo run --example cdplayer
//! > sm event load Kind of Blue
//! > sm event play
//! > sm state
//! ```
//!
//! Set `RUST_LOG=statechart=debug` to see the dispatcher's decisions.

use statechart::builder::{TableBuilder, TransitionBuilder};
use statechart::{
    event_enum, state_enum, ActionError, Event, Machine, Notification, StateDef,
    TransitionTable, Variables,
};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

state_enum! {
    enum CdState {
        Idle,
        Closed,
        Open,
        Deck,
        Playing,
        Paused,
    }
}

event_enum! {
    enum CdEvent {
        Play,
        Stop,
        Pause,
        Eject,
        Load,
        Forward,
        Back,
    }
}

fn player() -> Result<Arc<TransitionTable<CdState, CdEvent>>, statechart::ConfigurationError> {
    TableBuilder::<CdState, CdEvent>::new()
        .initial(CdState::Idle)
        .state(StateDef::new(CdState::Idle))
        .state(StateDef::new(CdState::Closed).parent(CdState::Idle).initial())
        .state(StateDef::new(CdState::Open).parent(CdState::Idle))
        .state(StateDef::new(CdState::Deck).exit_fn("reset track", |ctx| {
            ctx.variables.insert("track", 0);
        }))
        .state(StateDef::new(CdState::Playing).parent(CdState::Deck).initial())
        .state(StateDef::new(CdState::Paused).parent(CdState::Deck))
        .transition(
            TransitionBuilder::new()
                .from(CdState::Closed)
                .to(CdState::Deck)
                .on(CdEvent::Play)
                .when(|ctx| ctx.variables.contains_key("cd")),
        )
        .transition(TransitionBuilder::new().from(CdState::Open).to(CdState::Closed).on(CdEvent::Play))
        .transition(TransitionBuilder::new().from(CdState::Open).to(CdState::Closed).on(CdEvent::Eject))
        .transition(TransitionBuilder::new().from(CdState::Closed).to(CdState::Open).on(CdEvent::Eject))
        .transition(
            TransitionBuilder::new()
                .from(CdState::Idle)
                .on(CdEvent::Load)
                .internal()
                .action_fn("load disc", |ctx| {
                    let cd = ctx
                        .headers
                        .get("cd")
                        .cloned()
                        .ok_or_else(|| ActionError::new("LOAD needs a disc title"))?;
                    ctx.variables.insert("cd", cd);
                    Ok(())
                }),
        )
        .transition(TransitionBuilder::new().from(CdState::Playing).to(CdState::Paused).on(CdEvent::Pause))
        .transition(TransitionBuilder::new().from(CdState::Paused).to(CdState::Playing).on(CdEvent::Pause))
        .transition(TransitionBuilder::new().from(CdState::Deck).to(CdState::Idle).on(CdEvent::Stop))
        .transition(TransitionBuilder::new().from(CdState::Deck).to(CdState::Open).on(CdEvent::Eject))
        .transition(
            TransitionBuilder::new()
                .from(CdState::Playing)
                .on(CdEvent::Forward)
                .internal()
                .action_fn("next track", |ctx| {
                    let track = ctx.variables.get_as::<u32>("track").unwrap_or(0);
                    ctx.variables.insert("track", track + 1);
                    Ok(())
                }),
        )
        .transition(
            TransitionBuilder::new()
                .from(CdState::Playing)
                .on(CdEvent::Back)
                .internal()
                .when(|ctx| ctx.variables.get_as::<u32>("track").unwrap_or(0) > 0)
                .action_fn("previous track", |ctx| {
                    let track = ctx.variables.get_as::<u32>("track").unwrap_or(0);
                    ctx.variables.insert("track", track.saturating_sub(1));
                    Ok(())
                }),
        )
        .build_shared()
}

/// Host glue for `sm event <EVENT> [disc title]`.
fn send(machine: &mut Machine<CdState, CdEvent>, args: &[&str]) -> String {
    let Some((name, rest)) = args.split_first() else {
        return "usage: sm event <EVENT>".to_string();
    };
    let event: CdEvent = match name.parse() {
        Ok(event) => event,
        Err(err) => return err.to_string(),
    };

    let headers = if rest.is_empty() {
        Variables::new()
    } else {
        Variables::new().with("cd", rest.join(" "))
    };
    let result = machine.send_event_with(event, headers);
    for diagnostic in result.all_diagnostics() {
        eprintln!("warning: {diagnostic}");
    }
    format!("Event {} send", event.name().to_uppercase())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut machine = Machine::new(player()?);
    machine.subscribe(|n: &Notification<CdState, CdEvent>| {
        if let Notification::StateEntered(state) = n {
            println!("  entered {state}");
        }
        Ok(())
    });

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    print!("> ");
    stdout.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["sm", "event", args @ ..] => println!("{}", send(&mut machine, args)),
            ["sm", "state"] => println!("{:?}", machine.current_states()),
            ["sm", "variables"] => println!("{:?}", machine.variables()),
            ["quit"] | ["exit"] => break,
            [] => {}
            _ => println!("commands: sm event <EVENT> [title], sm state, sm variables, quit"),
        }
        print!("> ");
        stdout.flush()?;
    }
    Ok(())
}
