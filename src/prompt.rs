//! Prompt bank for the generated tasks.
//!
//! Every prompt is the shared scene prefix, the switching-rule sentence, and
//! one of five per-type phrasings with `{countdown_a}`, `{countdown_b}` and
//! `{time_elapsed}` placeholders filled from the sampled parameters.

use rand::Rng;
use rand::rngs::SmallRng;

use crate::model::TaskType;

pub const SCENE_PREFIX: &str = "This scene shows a crossroad with two traffic lights. ";
pub const RULE_EXPLANATION: &str = "The two traffic lights are opposite to each other: \
    when one is red, the other is green, and vice versa. ";

const BASIC: [&str; 5] = [
    concat!(
        "Currently, Traffic Light A shows red with countdown {countdown_a}. Traffic Light B shows green. ",
        "Generate a video showing the countdown number decrementing from {countdown_a} to 0, then show the final state of both traffic lights.",
    ),
    concat!(
        "At the moment, Traffic Light A displays red with a countdown of {countdown_a}. Traffic Light B displays green. ",
        "Create a video that shows the countdown decreasing from {countdown_a} to 0, followed by the final state of both lights.",
    ),
    concat!(
        "Traffic Light A is currently red with countdown {countdown_a}, while Traffic Light B is green. ",
        "Produce a video demonstrating the countdown reducing from {countdown_a} to 0, then reveal the final state of both traffic lights.",
    ),
    concat!(
        "Right now, Traffic Light A shows red with a {countdown_a}-second countdown. Traffic Light B shows green. ",
        "Generate a video where the countdown decrements from {countdown_a} to 0, and then display the final state of both lights.",
    ),
    concat!(
        "The current state: Traffic Light A is red with countdown {countdown_a}, Traffic Light B is green. ",
        "Create a video showing the countdown going from {countdown_a} down to 0, then show what both traffic lights look like at the end.",
    ),
];

const EXTENDED: [&str; 5] = [
    concat!(
        "Currently, Traffic Light A shows red with countdown {countdown_a}. Traffic Light B shows green. ",
        "Generate a video showing the countdown number decrementing from {countdown_a} to 0, then show the final state of both traffic lights.",
    ),
    concat!(
        "At present, Traffic Light A displays red with a countdown timer at {countdown_a}. Traffic Light B displays green. ",
        "Create a video that demonstrates the countdown decreasing from {countdown_a} to 0, followed by the final state.",
    ),
    concat!(
        "Traffic Light A currently shows red with a {countdown_a}-second countdown, while Traffic Light B shows green. ",
        "Produce a video showing the countdown reducing from {countdown_a} to 0, then reveal the final state of both lights.",
    ),
    concat!(
        "The initial state: Traffic Light A is red with countdown {countdown_a}, and Traffic Light B is green. ",
        "Generate a video where the countdown goes from {countdown_a} down to 0, then display the final state of both traffic lights.",
    ),
    concat!(
        "Right now, Traffic Light A has a red signal with countdown {countdown_a}. Traffic Light B has a green signal. ",
        "Create a video showing the countdown timer decrementing from {countdown_a} to 0, and then show the final state.",
    ),
];

const DUAL_COUNTDOWN: [&str; 5] = [
    concat!(
        "Currently, Traffic Light A shows red with countdown {countdown_a}. Traffic Light B shows green with countdown {countdown_b}. ",
        "Generate a video showing both countdown numbers decrementing simultaneously. When any countdown reaches 0, apply the relative rule to switch states. Then show the final state of both traffic lights.",
    ),
    concat!(
        "At the moment, Traffic Light A displays red with countdown {countdown_a}, and Traffic Light B displays green with countdown {countdown_b}. ",
        "Create a video where both countdowns decrease at the same time. When either countdown hits 0, the lights switch states according to the rule. Display the final state.",
    ),
    concat!(
        "Traffic Light A is red with a {countdown_a}-second countdown, while Traffic Light B is green with a {countdown_b}-second countdown. ",
        "Produce a video showing both countdowns decrementing together. When one reaches 0, apply the state switch rule. Show the final state of both lights.",
    ),
    concat!(
        "The current state: Traffic Light A shows red (countdown {countdown_a}), Traffic Light B shows green (countdown {countdown_b}). ",
        "Generate a video with both countdowns decreasing simultaneously. When any countdown reaches 0, the lights switch states. Display the final state.",
    ),
    concat!(
        "Right now, Traffic Light A has red with countdown {countdown_a}, and Traffic Light B has green with countdown {countdown_b}. ",
        "Create a video showing both countdowns going down at the same time. When either hits 0, apply the opposite state rule. Show the final state.",
    ),
];

const EXPLICIT_HORIZON: [&str; 5] = [
    concat!(
        "Currently, Traffic Light A shows red with countdown {countdown_a}. Traffic Light B shows green with countdown {countdown_b}. ",
        "Generate a video showing countdown numbers decrementing. When countdown reaches 0, apply the relative rule to switch states. Then show the final state of both traffic lights after {time_elapsed} seconds.",
    ),
    concat!(
        "At the moment, Traffic Light A displays red (countdown {countdown_a}), and Traffic Light B displays green (countdown {countdown_b}). ",
        "Create a video where countdowns decrease. When a countdown hits 0, the lights switch states. Display the final state after {time_elapsed} seconds have passed.",
    ),
    concat!(
        "Traffic Light A is red with countdown {countdown_a}, while Traffic Light B is green with countdown {countdown_b}. ",
        "Produce a video showing the countdowns decrementing. When any countdown reaches 0, apply the state switch rule. Show the final state after {time_elapsed} seconds.",
    ),
    concat!(
        "The initial state: Traffic Light A shows red (countdown {countdown_a}), Traffic Light B shows green (countdown {countdown_b}). ",
        "Generate a video with countdowns decreasing. When a countdown reaches 0, the lights switch according to the rule. Display the state after {time_elapsed} seconds.",
    ),
    concat!(
        "Right now, Traffic Light A has red with countdown {countdown_a}, Traffic Light B has green with countdown {countdown_b}. ",
        "Create a video showing the countdowns going down. When either reaches 0, apply the opposite state rule. Show the final state after {time_elapsed} seconds.",
    ),
];

/// The five phrasings available for a task type.
pub fn variants(task_type: TaskType) -> &'static [&'static str] {
    match task_type {
        TaskType::Basic => &BASIC,
        TaskType::Extended => &EXTENDED,
        TaskType::DualCountdown => &DUAL_COUNTDOWN,
        TaskType::ExplicitHorizon => &EXPLICIT_HORIZON,
    }
}

/// Values substituted into the placeholders.
#[derive(Clone, Copy, Debug)]
pub struct PromptInputs {
    pub countdown_a: u32,
    pub countdown_b: u32,
    pub time_elapsed: Option<u32>,
}

/// Render the given variant (taken modulo the bank size) into a full prompt.
pub fn build(task_type: TaskType, variant: usize, inputs: PromptInputs) -> String {
    let bank = variants(task_type);
    let body = bank[variant % bank.len()];
    let mut prompt = format!("{SCENE_PREFIX}{RULE_EXPLANATION}{body}");
    prompt = prompt.replace("{countdown_a}", &inputs.countdown_a.to_string());
    prompt = prompt.replace("{countdown_b}", &inputs.countdown_b.to_string());
    if let Some(elapsed) = inputs.time_elapsed {
        prompt = prompt.replace("{time_elapsed}", &elapsed.to_string());
    }
    prompt
}

/// Render a uniformly drawn variant.
pub fn choose(task_type: TaskType, rng: &mut SmallRng, inputs: PromptInputs) -> String {
    let variant = rng.random_range(0..variants(task_type).len());
    build(task_type, variant, inputs)
}
