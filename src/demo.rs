//! Scripted session used by `angler demo`.

use std::sync::Arc;
use std::time::Duration;

use angler::captcha::{ChallengeOutcome, render};
use angler::signals::{GameEvent, Signal};
use angler::state_machine::AutomationState;
use angler::{AnglerConfig, Session};
use anyhow::{Result, bail};
use regex::Regex;
use tokio::time::sleep;

use crate::ui::SessionProgress;

/// Delay before the simulated server reacts.
const SERVER_LAG: Duration = Duration::from_millis(300);

pub async fn run(config: AnglerConfig, code: &str) -> Result<()> {
    let progress = SessionProgress::start("starting session");
    let session = Session::builder(config.clone())
        .transport(Arc::new(progress.transport()))
        .start()?;
    let hub = session.hub().clone();
    let machine = session.machine().clone();

    // 1. Paced commands.
    let fishing = session.set_state(AutomationState::Fishing);
    progress.update_state(&session.snapshot());
    progress.step("queueing three commands and a chat line under the fishing epoch");
    let (warp, cast, bait, greet) = tokio::join!(
        session.command(fishing, "/warp pond"),
        session.command(fishing, "/rod cast"),
        session.command(fishing, "/bait use"),
        session.chat(fishing, "gl everyone"),
    );
    progress.delivery("/warp pond", &warp);
    progress.delivery("/rod cast", &cast);
    progress.delivery("/bait use", &bait);
    progress.delivery("gl everyone", &greet);

    // 2. A wait resolved by an inbound chat line.
    progress.step("waiting for a catch message or a bite sound");
    tokio::spawn({
        let hub = hub.clone();
        async move {
            sleep(SERVER_LAG).await;
            hub.emit(&GameEvent::chat("You caught a Salmon!"));
        }
    });
    let catch = session
        .await_first(
            fishing,
            vec![
                Signal::chat_matching("catch", Regex::new(r"^You caught an? \w+!$")?),
                Signal::sound("bite", "entity.fishing_bobber.splash"),
            ],
            Some(Duration::from_secs(5)),
        )
        .await;
    progress.wait_outcome("catch", &catch);

    // 3. A wait cancelled by a state transition.
    progress.step("waiting for a bite while a challenge interrupts");
    tokio::spawn({
        let machine = machine.clone();
        async move {
            sleep(SERVER_LAG).await;
            machine.set_state(AutomationState::SolvingChallenge);
        }
    });
    let bite = session
        .await_first(
            fishing,
            vec![Signal::sound("bite", "entity.fishing_bobber.splash")],
            Some(Duration::from_secs(10)),
        )
        .await;
    progress.wait_outcome("bite", &bite);
    progress.update_state(&session.snapshot());
    let reel = session.command(fishing, "/rod reel").await;
    progress.delivery("/rod reel (fishing epoch)", &reel);

    // 4. Challenge: a partial raster first, then the full code.
    let solving = session.epoch();
    progress.step("solving the challenge");
    let partial: String = code.chars().take(code.chars().count() / 2).collect();
    let ink = config.ink_values;
    tokio::spawn({
        let hub = hub.clone();
        let code = code.to_string();
        async move {
            sleep(SERVER_LAG).await;
            hub.emit(&GameEvent::Raster(render(&partial, ink, 8)));
            sleep(SERVER_LAG).await;
            hub.emit(&GameEvent::Raster(render(&code, ink, 8)));
        }
    });
    match session.solve_challenge(solving).await {
        ChallengeOutcome::Solved(read) => {
            let answer = session.chat(solving, read.clone()).await;
            progress.delivery(&format!("answer {read}"), &answer);
        }
        other => {
            session.shutdown().await;
            progress.finish(&session.history());
            bail!("challenge not solved: {other:?}");
        }
    }

    session.resume_previous();
    progress.update_state(&session.snapshot());
    progress.step("resumed previous activity");

    session.shutdown().await;
    progress.finish(&session.history());
    Ok(())
}
