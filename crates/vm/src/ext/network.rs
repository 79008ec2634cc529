use std::fmt;

use eyre::{bail, Result, WrapErr};
use futures::{stream::FuturesUnordered, StreamExt};
use intcode_config::Configuration;
use tokio::{
    sync::mpsc,
    task::{AbortHandle, JoinHandle},
};
use tracing::{debug, info};

use crate::core::{
    channel::Channel,
    constants::{DEFAULT_STOP_ADDRESS, PACKET_SIZE},
    input::Polling,
    vm::Vm,
};

/// A packet exchanged between network nodes: a destination address and an `(x, y)` payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Packet {
    /// The address of the receiving node.
    pub destination: i64,

    /// The first payload word.
    pub x: i64,

    /// The second payload word.
    pub y: i64,
}

impl Packet {
    /// Builds a packet from the three words a node emits for it.
    pub fn from_words(words: [i64; PACKET_SIZE]) -> Self {
        Self { destination: words[0], x: words[1], y: words[2] }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- ({}, {})", self.destination, self.x, self.y)
    }
}

/// A network of nodes running the same program, connected through a supervising router.
///
/// Node `n` boots with its address `n` queued on its input. Nodes never block on input: when
/// their queue is empty they read the configured idle value instead. Every three words a node
/// emits form a [`Packet`], which the router delivers to the input queue of its destination.
/// The network stops at the first packet addressed to the stop address.
#[derive(Clone, Debug)]
pub struct Network {
    program: Vec<i64>,
    size: usize,
    stop_address: i64,
    config: Configuration,
}

impl Network {
    /// Creates a network of `size` nodes, addressed `0..size`.
    pub fn new(program: &[i64], size: usize) -> Self {
        Self {
            program: program.to_vec(),
            size,
            stop_address: DEFAULT_STOP_ADDRESS,
            config: Configuration::default(),
        }
    }

    /// Applies `config` to every node. The idle input value and poll interval of the nodes come
    /// from it.
    pub fn with_config(mut self, config: &Configuration) -> Self {
        self.config = config.clone();
        self
    }

    /// Sets the address that stops the network.
    pub fn with_stop_address(mut self, stop_address: i64) -> Self {
        self.stop_address = stop_address;
        self
    }

    /// Boots every node and routes packets until one is addressed to the stop address, which is
    /// returned. Every node is cancelled before returning, whatever the outcome.
    pub async fn run(&self) -> Result<Packet> {
        if self.size == 0 {
            bail!("network has no nodes");
        }

        let (router, mut packets) = mpsc::unbounded_channel::<Packet>();
        let mut inputs = Vec::with_capacity(self.size);
        let mut nodes = FuturesUnordered::new();
        let mut aborts = Vec::with_capacity(self.size);

        for address in 0..self.size {
            let input = Channel::with_values([address as i64]);
            let output = Channel::new();
            let mut vm = Vm::new(
                &self.program,
                Polling::channel(input.clone(), self.config.poll_interval()),
                output.clone(),
            )
            .with_config(&self.config)
            .with_idle_input(Some(self.config.idle_input));

            let router = router.clone();
            let node = tokio::spawn(async move {
                debug!(node = address, "node started");
                let mut partial = Vec::with_capacity(PACKET_SIZE);

                // forward packets while the node runs, then flush whatever it left behind
                let result = tokio::select! {
                    result = vm.run() => result,
                    () = forward_packets(address, &output, &mut partial, &router) => return Ok(()),
                };
                result.wrap_err_with(|| format!("node {address} faulted"))?;

                partial.extend(output.drain_all());
                flush_packets(address, &mut partial, &router);
                debug!(node = address, "node halted");
                Ok::<_, eyre::Report>(())
            });
            aborts.push(node.abort_handle());
            nodes.push(node);

            inputs.push(input);
        }

        // only the nodes hold senders now, so the router closes once every node is gone
        drop(router);

        let result = self.route(&inputs, &mut packets, &mut nodes).await;
        shutdown(&aborts);
        result
    }

    /// Delivers packets until one is addressed to the stop address, or a node fails.
    async fn route(
        &self,
        inputs: &[Channel],
        packets: &mut mpsc::UnboundedReceiver<Packet>,
        nodes: &mut FuturesUnordered<JoinHandle<Result<()>>>,
    ) -> Result<Packet> {
        loop {
            tokio::select! {
                packet = packets.recv() => {
                    let Some(packet) = packet else {
                        bail!("network went silent before reaching address {}", self.stop_address);
                    };

                    if packet.destination == self.stop_address {
                        info!(%packet, "packet reached stop address, stopping network");
                        return Ok(packet);
                    }

                    match usize::try_from(packet.destination).ok().and_then(|d| inputs.get(d)) {
                        Some(input) => {
                            debug!(%packet, "routing packet");
                            input.send_all([packet.x, packet.y]);
                        }
                        None => debug!(%packet, "dropping packet to unknown address"),
                    }
                }
                Some(joined) = nodes.next(), if !nodes.is_empty() => match joined {
                    Ok(result) => result?,
                    Err(e) if e.is_cancelled() => debug!("node task cancelled"),
                    Err(e) => bail!("node task panicked: {e}"),
                },
            }
        }
    }
}

/// Collects the words emitted by node `address` into `partial`, handing every complete packet to
/// the router. Never returns; `partial` stays consistent if the future is dropped.
async fn forward_packets(
    address: usize,
    output: &Channel,
    partial: &mut Vec<i64>,
    router: &mpsc::UnboundedSender<Packet>,
) {
    loop {
        partial.push(output.recv().await);
        flush_packets(address, partial, router);
    }
}

/// Hands every complete packet at the front of `partial` to the router.
fn flush_packets(address: usize, partial: &mut Vec<i64>, router: &mpsc::UnboundedSender<Packet>) {
    while partial.len() >= PACKET_SIZE {
        let packet = Packet::from_words([partial[0], partial[1], partial[2]]);
        partial.drain(..PACKET_SIZE);

        debug!(node = address, %packet, "node sent packet");
        if router.send(packet).is_err() {
            debug!(node = address, "router closed, discarding packet");
        }
    }
}

/// Cancels every node task.
fn shutdown(aborts: &[AbortHandle]) {
    for abort in aborts {
        abort.abort();
    }
    debug!(tasks = aborts.len(), "network shut down");
}
