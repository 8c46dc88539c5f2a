//! Transition chains across two or more clips.

use std::path::PathBuf;

use mfx_av::probe_all;
use mfx_core::{Error, Payloads, Result};
use mfx_graph::transition::{build_transition, TransitionSpec};
use mfx_graph::{BlendStrategy, TransitionPlan};
use serde_json::json;

use crate::context::OpContext;
use crate::item::ItemOutput;
use crate::operation::TransitionParams;

const OPERATION: &str = "transitionApply";

pub async fn transition_apply(
    ctx: &OpContext,
    params: &TransitionParams,
    payloads: &Payloads,
) -> Result<ItemOutput> {
    if params.sources.len() < 2 {
        return Err(Error::validation(
            "Transition (Apply) operation requires at least two source videos.",
        ));
    }
    if !(params.duration > 0.0) {
        return Err(Error::validation("Transition duration must be greater than zero."));
    }

    let mut inputs = ctx.resolver.resolve(&params.sources, payloads).await?;
    let result = apply(ctx, &inputs.paths(), params).await;
    ctx.release(OPERATION, &mut inputs);
    let (output, plan, message) = result?;

    let blends: Vec<_> = plan
        .blends
        .iter()
        .map(|b| json!({ "offset": b.offset, "duration": b.duration }))
        .collect();
    let mut fields = json!({
        "requestedTransition": params.transition,
        "transition": plan.transition,
        "strategy": strategy_name(plan.strategy),
        "blends": blends,
        "withAudio": plan.with_audio,
    });
    if let Some(message) = message {
        fields["message"] = json!(message);
    }
    Ok(ItemOutput::media(OPERATION, output).with_fields(fields))
}

fn strategy_name(strategy: BlendStrategy) -> &'static str {
    match strategy {
        BlendStrategy::Native => "crossfade",
        BlendStrategy::EdgeFade => "edgeFade",
    }
}

async fn apply(
    ctx: &OpContext,
    clips: &[PathBuf],
    params: &TransitionParams,
) -> Result<(PathBuf, TransitionPlan, Option<String>)> {
    let support = ctx.capabilities.check_transition_support(&params.transition).await;
    if let Some(message) = &support.message {
        tracing::warn!("{message}");
    }
    let effective = support.effective(&params.transition).to_string();
    let strategy = if ctx.capabilities.capabilities().await.crossfade {
        BlendStrategy::Native
    } else {
        BlendStrategy::EdgeFade
    };

    let probes = probe_all(ctx.prober.as_ref(), clips).await?;
    let with_audio = probes.iter().filter(|p| p.has_audio).count();
    if with_audio > 0 && with_audio < probes.len() {
        tracing::warn!(
            "{with_audio} of {} clips have audio; the transition output will be video-only",
            probes.len()
        );
    }

    let output = ctx.output(&params.output_format)?;
    let spec = TransitionSpec {
        clips,
        probes: &probes,
        transition: &effective,
        strategy,
        duration: params.duration,
    };
    let (invocation, plan) = build_transition(&spec, output.path())?;
    tracing::info!(
        "applying '{}' across {} clips ({} blends)",
        plan.transition,
        clips.len(),
        plan.blends.len()
    );
    ctx.run(OPERATION, &invocation).await?;
    Ok((output.keep(), plan, support.message))
}
