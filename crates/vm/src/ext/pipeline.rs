use eyre::{bail, OptionExt, Result, WrapErr};
use futures::future::try_join_all;
use intcode_config::Configuration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::{
    core::{
        channel::Channel,
        vm::{ExecutionResult, Vm},
    },
    error::Error,
};

/// A chain of VMs running the same program, one per phase setting.
///
/// Stage `k` starts with its phase setting queued on its input. The output of stage `k` is the
/// input of stage `k + 1`. In feedback mode the output of the last stage is the input of the
/// first, closing the chain into a ring that runs until every stage halts.
///
/// ```
/// use intcode_vm::ext::pipeline::Pipeline;
///
/// # tokio_test();
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn tokio_test() {
/// let program = [3, 15, 3, 16, 1002, 16, 10, 16, 1, 16, 15, 15, 4, 15, 99, 0, 0];
/// let signal = Pipeline::new(&program, &[4, 3, 2, 1, 0]).run(0).await.expect("pipeline failed");
/// assert_eq!(signal, 43210);
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Pipeline {
    program: Vec<i64>,
    phases: Vec<i64>,
    feedback: bool,
    config: Configuration,
}

impl Pipeline {
    /// Creates a straight pipeline with one stage per phase setting.
    pub fn new(program: &[i64], phases: &[i64]) -> Self {
        Self {
            program: program.to_vec(),
            phases: phases.to_vec(),
            feedback: false,
            config: Configuration::default(),
        }
    }

    /// Closes the pipeline into a ring when `feedback` is set.
    pub fn feedback(mut self, feedback: bool) -> Self {
        self.feedback = feedback;
        self
    }

    /// Applies `config` to every stage.
    pub fn with_config(mut self, config: &Configuration) -> Self {
        self.config = config.clone();
        self
    }

    /// Runs every stage to completion, feeding `initial_signal` to the first one. Returns the
    /// last value left on the final channel.
    pub async fn run(&self, initial_signal: i64) -> Result<i64> {
        if self.phases.is_empty() {
            bail!("pipeline has no stages");
        }

        let inputs = self.phases.iter().map(|phase| Channel::with_values([*phase])).collect::<Vec<_>>();
        inputs[0].send(initial_signal);

        // the ring reuses the first input as the final output
        let last = if self.feedback { inputs[0].clone() } else { Channel::new() };

        let handles = inputs
            .iter()
            .enumerate()
            .map(|(stage, input)| {
                let output = inputs.get(stage + 1).cloned().unwrap_or_else(|| last.clone());
                let mut vm =
                    Vm::new(&self.program, input.clone(), output).with_config(&self.config);

                debug!(stage, phase = self.phases[stage], "starting amplifier");
                tokio::spawn(async move { vm.run().await })
            })
            .collect::<Vec<_>>();

        let aborts = handles.iter().map(|handle| handle.abort_handle()).collect::<Vec<_>>();
        let stages = handles.into_iter().enumerate().map(|(stage, handle)| join_stage(stage, handle));

        // a faulted stage would leave its neighbours waiting forever
        if let Err(e) = try_join_all(stages).await {
            aborts.iter().for_each(|abort| abort.abort());
            return Err(e);
        }

        last.drain_all().pop().ok_or_eyre("pipeline produced no output")
    }

    /// Tries every ordering of `phase_values` and returns the highest signal along with the
    /// phases that produced it.
    ///
    /// ```
    /// use intcode_vm::ext::pipeline::Pipeline;
    ///
    /// # tokio_test();
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn tokio_test() {
    /// let program = [
    ///     3, 23, 3, 24, 1002, 24, 10, 24, 1002, 23, -1, 23, 101, 5, 23, 23, 1, 24, 23, 23, 4, 23,
    ///     99, 0, 0,
    /// ];
    /// let (signal, phases) =
    ///     Pipeline::max_signal(&program, &[0, 1, 2, 3, 4], false).await.expect("search failed");
    /// assert_eq!(signal, 54321);
    /// assert_eq!(phases, vec![0, 1, 2, 3, 4]);
    /// # }
    /// ```
    pub async fn max_signal(
        program: &[i64],
        phase_values: &[i64],
        feedback: bool,
    ) -> Result<(i64, Vec<i64>)> {
        let mut best: Option<(i64, Vec<i64>)> = None;

        for phases in permutations(phase_values) {
            let signal = Pipeline::new(program, &phases)
                .feedback(feedback)
                .run(0)
                .await
                .wrap_err_with(|| format!("pipeline with phases {phases:?} failed"))?;

            if best.as_ref().is_none_or(|(current, _)| signal > *current) {
                best = Some((signal, phases));
            }
        }

        best.ok_or_eyre("no phase values to try")
    }
}

/// Awaits a spawned stage, attaching the stage index to any failure.
async fn join_stage(
    stage: usize,
    handle: JoinHandle<Result<ExecutionResult, Error>>,
) -> Result<ExecutionResult> {
    let result = handle.await.wrap_err_with(|| format!("amplifier {stage} did not complete"))?;
    let result = result.wrap_err_with(|| format!("amplifier {stage} faulted"))?;
    debug!(stage, steps = result.steps, "amplifier halted");
    Ok(result)
}

/// Every ordering of `values`, in lexicographic order of positions.
fn permutations(values: &[i64]) -> Vec<Vec<i64>> {
    if values.is_empty() {
        return Vec::new();
    }
    if values.len() == 1 {
        return vec![values.to_vec()];
    }

    let mut result = Vec::new();
    for (i, value) in values.iter().enumerate() {
        let mut rest = values.to_vec();
        rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, *value);
            result.push(tail);
        }
    }
    result
}
