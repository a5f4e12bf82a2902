//! Crossbar multiplexing logical command/response ports onto one bus engine.
//!
//! Each logical user registers a port: a command stream in, a response
//! stream out, and an activation level. A round-robin arbiter decides which
//! port currently owns the engine; only the granted port's commands are
//! forwarded, only the granted port receives responses, and the granted
//! port's activation is forwarded as the engine's `active` input. At most
//! one port holds the grant at any time.
//!
//! The grant is frozen while a command is in flight and while the last
//! response announced an unfinished transfer, so a logical transaction —
//! including its continuation commands — never loses the bus part-way.
//!
//! Ports are registered once at system construction and never removed;
//! registration order fixes the round-robin slot order.

mod bridge;

pub use bridge::{DomainBridge, BRIDGE_DEPTH};

use i2c_core::{Command, Fifo, Response};

/// Handle for a registered port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortId(usize);

impl PortId {
    /// Round-robin slot index assigned at registration.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
struct UserPort {
    cmd: Fifo<Command>,
    rsp: Fifo<Response>,
    /// "This user wants the bus" level.
    active: bool,
    /// Arbitration drive; `None` follows `active`.
    request: Option<bool>,
}

impl UserPort {
    fn request_level(&self) -> bool {
        self.request.unwrap_or(self.active)
    }
}

/// Pure round-robin step: the next requesting index after `last`, wrapping,
/// with `last` itself considered last. `None` when nobody requests.
#[must_use]
pub fn next_grant(requests: &[bool], last: usize) -> Option<usize> {
    let n = requests.len();
    if n == 0 {
        return None;
    }
    (1..=n).map(|step| (last + step) % n).find(|&i| requests[i])
}

/// Round-robin crossbar over one bus engine.
#[derive(Debug)]
pub struct Crossbar {
    ports: Vec<UserPort>,
    /// Last granted slot; `None` until the first grant.
    grant: Option<usize>,
    /// Commands forwarded whose response has not yet come back.
    in_flight: usize,
    /// The last response announced an unfinished transfer.
    continuation: bool,
    bridge: DomainBridge,
}

impl Crossbar {
    /// Crossbar sharing the engine's clock domain (stream-register bridge).
    #[must_use]
    pub fn new() -> Self {
        Self::with_bridge_depth(1)
    }

    /// Crossbar bridging a different logical clock domain through buffered
    /// ordered channels.
    #[must_use]
    pub fn with_bridge() -> Self {
        Self::with_bridge_depth(BRIDGE_DEPTH)
    }

    fn with_bridge_depth(depth: usize) -> Self {
        Self {
            ports: Vec::new(),
            grant: None,
            in_flight: 0,
            continuation: false,
            bridge: DomainBridge::new(depth),
        }
    }

    /// Register a port whose arbitration request follows its activation.
    pub fn register(&mut self) -> PortId {
        self.register_port(None)
    }

    /// Register a port with an explicit request line (set via
    /// [`Crossbar::set_request`]).
    pub fn register_with_request(&mut self) -> PortId {
        self.register_port(Some(false))
    }

    fn register_port(&mut self, request: Option<bool>) -> PortId {
        self.ports.push(UserPort {
            cmd: Fifo::new(1),
            rsp: Fifo::new(1),
            active: false,
            request,
        });
        PortId(self.ports.len() - 1)
    }

    #[must_use]
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    /// Set a port's activation level.
    pub fn set_activation(&mut self, port: PortId, active: bool) {
        self.ports[port.0].active = active;
    }

    /// Set a port's explicit request level; ignored for ports registered
    /// without one.
    pub fn set_request(&mut self, port: PortId, request: bool) {
        if let Some(r) = &mut self.ports[port.0].request {
            *r = request;
        }
    }

    /// Present a command on a port; handed back while the slot is occupied.
    pub fn submit(&mut self, port: PortId, cmd: Command) -> Result<(), Command> {
        self.ports[port.0].cmd.push(cmd)
    }

    /// Collect a response delivered to a port.
    pub fn take_response(&mut self, port: PortId) -> Option<Response> {
        self.ports[port.0].rsp.pop()
    }

    /// Currently granted slot, if any port has ever been granted.
    #[must_use]
    pub fn grant(&self) -> Option<usize> {
        self.grant
    }

    /// The granted port's activation, forwarded as the engine's `active`.
    #[must_use]
    pub fn engine_active(&self) -> bool {
        self.grant
            .and_then(|g| self.ports.get(g))
            .is_some_and(|p| p.active)
    }

    /// Advance the core-domain side one tick: re-arbitrate when the engine
    /// is quiescent for this crossbar, forward the granted port's command,
    /// and route any returned response to the granted port.
    pub fn tick(&mut self) {
        if self.in_flight == 0 && !self.continuation {
            let requests: Vec<bool> = self.ports.iter().map(UserPort::request_level).collect();
            let last = self.grant.unwrap_or(self.ports.len().saturating_sub(1));
            if let Some(next) = next_grant(&requests, last) {
                self.grant = Some(next);
            }
        }

        let Some(granted) = self.grant else {
            return;
        };

        // One command outstanding at a time: the next command (including a
        // continuation) is forwarded only after the previous response came
        // back, so a completed transaction always re-arbitrates first.
        if self.in_flight == 0 {
            if let Some(&cmd) = self.ports[granted].cmd.peek() {
                if self.bridge.push_command(cmd).is_ok() {
                    let _ = self.ports[granted].cmd.pop();
                    self.in_flight += 1;
                    self.continuation = false;
                }
            }
        }

        if let Some(&rsp) = self.bridge.response_pending() {
            if self.ports[granted].rsp.push(rsp).is_ok() {
                let _ = self.bridge.pop_response();
                self.in_flight = self.in_flight.saturating_sub(1);
                self.continuation = rsp.unfinished_tx || rsp.unfinished_rx;
            }
        }
    }

    // Phy-domain side: called on the engine domain's ticks only.

    /// A command is waiting for the engine.
    #[must_use]
    pub fn engine_command_pending(&self) -> bool {
        self.bridge.command_pending()
    }

    /// Dequeue the next command for the engine.
    pub fn take_engine_command(&mut self) -> Option<Command> {
        self.bridge.pop_command()
    }

    /// Room for another engine response.
    #[must_use]
    pub fn engine_response_ready(&self) -> bool {
        self.bridge.response_ready()
    }

    /// Enqueue a response from the engine; refused when the channel is full.
    pub fn put_engine_response(&mut self, rsp: Response) -> Result<(), Response> {
        self.bridge.push_response(rsp)
    }
}

impl Default for Crossbar {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_grant_rotates_in_ascending_wrap_order() {
        let all = [true, true, true];
        assert_eq!(next_grant(&all, 0), Some(1));
        assert_eq!(next_grant(&all, 1), Some(2));
        assert_eq!(next_grant(&all, 2), Some(0));
    }

    #[test]
    fn next_grant_skips_non_requesters_without_consuming_a_turn() {
        let reqs = [true, false, true];
        assert_eq!(next_grant(&reqs, 0), Some(2));
        assert_eq!(next_grant(&reqs, 2), Some(0));
    }

    #[test]
    fn next_grant_falls_back_to_last_when_sole_requester() {
        let reqs = [false, true, false];
        assert_eq!(next_grant(&reqs, 1), Some(1));
    }

    #[test]
    fn next_grant_none_when_nobody_requests() {
        assert_eq!(next_grant(&[false, false], 0), None);
        assert_eq!(next_grant(&[], 0), None);
    }

    fn cmd(address: u8) -> Command {
        Command {
            address,
            len_tx: 1,
            ..Command::default()
        }
    }

    /// Engine stand-in: consume one pending command, return its response.
    fn serve(xbar: &mut Crossbar, rsp: Response) {
        let taken = xbar.take_engine_command();
        assert!(taken.is_some(), "engine expected a command");
        xbar.put_engine_response(rsp).expect("response channel free");
    }

    #[test]
    fn service_order_alternates_between_two_requesting_ports() {
        let mut xbar = Crossbar::new();
        let a = xbar.register();
        let b = xbar.register();
        xbar.set_activation(a, true);
        xbar.set_activation(b, true);

        let mut order = Vec::new();
        for round in 0..6 {
            xbar.submit(a, cmd(0x10)).expect("port slot free");
            xbar.submit(b, cmd(0x20)).expect("port slot free");
            // Two transactions per round, one per port.
            for _ in 0..2 {
                xbar.tick();
                order.push(xbar.grant().expect("granted"));
                serve(&mut xbar, Response::default());
                xbar.tick();
            }
            // Both responses delivered to their own ports.
            assert!(xbar.take_response(a).is_some(), "round {round}");
            assert!(xbar.take_response(b).is_some(), "round {round}");
        }
        assert_eq!(order, [0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn non_requesting_port_is_skipped_in_rotation() {
        let mut xbar = Crossbar::new();
        let a = xbar.register();
        let b = xbar.register();
        let c = xbar.register();
        xbar.set_activation(a, true);
        xbar.set_activation(b, false);
        xbar.set_activation(c, true);

        let mut order = Vec::new();
        for _ in 0..4 {
            xbar.submit(a, cmd(1)).expect("port slot free");
            xbar.submit(c, cmd(3)).expect("port slot free");
            for _ in 0..2 {
                xbar.tick();
                order.push(xbar.grant().expect("granted"));
                serve(&mut xbar, Response::default());
                xbar.tick();
            }
            let _ = xbar.take_response(a);
            let _ = xbar.take_response(c);
        }
        assert_eq!(order, [0, 2, 0, 2, 0, 2, 0, 2]);
        assert!(xbar.take_response(b).is_none());
    }

    #[test]
    fn grant_holds_through_a_continuation() {
        let mut xbar = Crossbar::new();
        let a = xbar.register();
        let b = xbar.register();
        xbar.set_activation(a, true);
        xbar.set_activation(b, true);

        xbar.submit(a, cmd(0x10)).expect("port slot free");
        xbar.submit(b, cmd(0x20)).expect("port slot free");
        xbar.tick();
        assert_eq!(xbar.grant(), Some(0));

        // The engine reports the chunk unfinished: the grant must stay with
        // port 0 even though port 1 is requesting with a queued command.
        serve(
            &mut xbar,
            Response {
                unfinished_tx: true,
                ..Response::default()
            },
        );
        xbar.tick();
        assert_eq!(xbar.take_response(a).map(|r| r.unfinished_tx), Some(true));
        xbar.tick();
        assert_eq!(xbar.grant(), Some(0));
        assert!(
            !xbar.engine_command_pending(),
            "port 1's command must not reach the engine mid-transaction"
        );

        // Continuation command flows, final response releases the bus.
        xbar.submit(a, cmd(0x10)).expect("port slot free");
        xbar.tick();
        assert_eq!(xbar.grant(), Some(0));
        serve(&mut xbar, Response::default());
        xbar.tick();
        assert!(xbar.take_response(a).is_some());

        // Next grant rotates to port 1.
        xbar.tick();
        assert_eq!(xbar.grant(), Some(1));
    }

    #[test]
    fn explicit_request_line_overrides_activation_for_arbitration() {
        let mut xbar = Crossbar::new();
        let a = xbar.register_with_request();
        let b = xbar.register();
        xbar.set_activation(a, true); // wants the engine active...
        xbar.set_request(a, false); // ...but does not request the bus
        xbar.set_activation(b, true);

        xbar.submit(a, cmd(1)).expect("port slot free");
        xbar.submit(b, cmd(2)).expect("port slot free");
        xbar.tick();
        assert_eq!(xbar.grant(), Some(1), "non-requesting port skipped");

        // Raising the request makes port 0 eligible again.
        serve(&mut xbar, Response::default());
        xbar.tick();
        let _ = xbar.take_response(b);
        xbar.set_request(a, true);
        xbar.tick();
        assert_eq!(xbar.grant(), Some(0));
    }

    #[test]
    fn granted_ports_activation_reaches_the_engine() {
        let mut xbar = Crossbar::new();
        let a = xbar.register_with_request();
        xbar.set_request(a, true);
        xbar.set_activation(a, false);
        xbar.tick();
        assert_eq!(xbar.grant(), Some(0));
        assert!(!xbar.engine_active());

        xbar.set_activation(a, true);
        assert!(xbar.engine_active());
    }
}
