use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::ops::ControlFlow;
use std::path::PathBuf;

use dap::prelude::*;
use dap::responses::{
    ContinueResponse, EvaluateResponse, ScopesResponse, SetBreakpointsResponse, SetExceptionBreakpointsResponse,
    StackTraceResponse, ThreadsResponse, VariablesResponse,
};
use dap::types::Breakpoint;
use teal_asm::SourceMap;
use tracing::{debug, error, info, warn};

use crate::algod::{AlgodClient, LiveEndpoint};
use crate::error::AdapterError;
use crate::protocol::{AvmValue, DebugConfig, LaunchArgs, SimulateResponse};
use crate::replay::Replay;

pub type DynResult<T> = miette::Result<T, Box<dyn std::error::Error>>;

const THREAD_ID: i64 = 1;
const STACK_REFERENCE: i64 = 1;
const SCRATCH_REFERENCE: i64 = 2;

/// Outcome of one request: the response body plus the events that follow it.
struct Reply {
    body: ResponseBody,
    events: Vec<Event>,
    flow: ControlFlow<()>,
}

impl Reply {
    fn new(body: ResponseBody) -> Self {
        Self {
            body,
            events: Vec::new(),
            flow: ControlFlow::Continue(()),
        }
    }

    fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }
}

/// Debug adapter that replays a simulated TEAL execution trace.
#[derive(Debug, Default)]
pub struct TealAdapter {
    config: DebugConfig,
    live: Option<LiveEndpoint>,
    recorded: Option<SimulateResponse>,
    program: Option<PathBuf>,
    source_map: SourceMap,
    stop_on_entry: bool,
    breakpoints: BTreeSet<usize>,
    replay: Option<Replay>,
    configured: bool,
}

impl TealAdapter {
    pub fn set_config(&mut self, config: DebugConfig) {
        self.config = config;
    }

    /// Overrides the endpoint from the debug config.
    pub fn set_live(&mut self, endpoint: LiveEndpoint) {
        self.live = Some(endpoint);
    }

    /// A recorded trace always takes precedence over the live endpoint.
    pub fn set_replay(&mut self, response: SimulateResponse) {
        self.recorded = Some(response);
    }

    pub fn is_launched(&self) -> bool {
        self.replay.is_some()
    }

    /// Send log output to the DAP client
    pub fn send_log_output(&self, message: &str, server: &mut Server<impl io::Read, impl io::Write>) -> DynResult<()> {
        let event = Event::Output(events::OutputEventBody {
            output: message.to_string(),
            category: Some(types::OutputEventCategory::Console),
            group: None,
            variables_reference: None,
            source: None,
            line: None,
            column: None,
            data: None,
        });
        server.send_event(event)?;
        Ok(())
    }

    /// Handles one request. Request failures are answered with an error
    /// response; only transport failures are returned as errors.
    pub fn handle_request(
        &mut self,
        req: Request,
        server: &mut Server<impl io::Read, impl io::Write>,
    ) -> DynResult<ControlFlow<()>> {
        match self.execute(&req.command) {
            Ok(reply) => {
                server.respond(req.success(reply.body))?;
                for event in reply.events {
                    server.send_event(event)?;
                }
                Ok(reply.flow)
            }
            Err(e) => {
                error!(error = %e, "Failed to handle DAP request");
                server.respond(req.error(&e.to_string()))?;
                Ok(ControlFlow::Continue(()))
            }
        }
    }

    fn execute(&mut self, command: &Command) -> Result<Reply, AdapterError> {
        let reply = match command {
            Command::Initialize(args) => {
                debug!(client = ?args.client_name, "Received Initialize request");
                let capabilities = types::Capabilities {
                    supports_configuration_done_request: Some(true),
                    supports_evaluate_for_hovers: Some(false),
                    supports_step_back: Some(false),
                    ..Default::default()
                };
                Reply::new(ResponseBody::Initialize(capabilities)).with_events(vec![Event::Initialized])
            }
            Command::Launch(raw_args) => {
                let args: LaunchArgs = match &raw_args.additional_data {
                    Some(data) => serde_json::from_value(data.clone()).map_err(AdapterError::LaunchArgumentsError)?,
                    None => LaunchArgs::default(),
                };
                debug!(?args, "Received Launch request");

                self.launch(args)?;
                let events = if self.configured { self.start() } else { Vec::new() };
                Reply::new(ResponseBody::Launch).with_events(events)
            }
            Command::SetExceptionBreakpoints(_) => {
                debug!("Received SetExceptionBreakpoints request");
                Reply::new(ResponseBody::SetExceptionBreakpoints(SetExceptionBreakpointsResponse {
                    breakpoints: None,
                }))
            }
            Command::SetBreakpoints(args) => {
                debug!(?args, "Received SetBreakpoints request");
                let requested = args.breakpoints.clone().unwrap_or_default();
                self.breakpoints.clear();

                let breakpoints = requested
                    .iter()
                    .enumerate()
                    .map(|(i, bp)| {
                        let line = usize::try_from(bp.line).unwrap_or_default();
                        self.breakpoints.insert(line);
                        // lines can only be checked once a program has been loaded
                        let verified = self.program.is_none() || !self.source_map.pcs_for_line(line).is_empty();
                        Breakpoint {
                            verified,
                            line: Some(bp.line),
                            column: bp.column,
                            end_line: None,
                            end_column: None,
                            source: Some(args.source.clone()),
                            message: (!verified).then(|| "No instruction on this line".to_string()),
                            id: Some(i as i64 + 1),
                            instruction_reference: None,
                            offset: None,
                        }
                    })
                    .collect();

                Reply::new(ResponseBody::SetBreakpoints(SetBreakpointsResponse { breakpoints }))
            }
            Command::ConfigurationDone => {
                debug!("Received ConfigurationDone request");
                self.configured = true;
                let events = if self.is_launched() { self.start() } else { Vec::new() };
                Reply::new(ResponseBody::ConfigurationDone).with_events(events)
            }
            Command::Threads => Reply::new(ResponseBody::Threads(ThreadsResponse {
                threads: vec![types::Thread {
                    id: THREAD_ID,
                    name: "main".to_string(),
                }],
            })),
            Command::StackTrace(args) => {
                debug!(?args, "Received StackTrace request");
                let stack_frames = self.stack_frames();
                Reply::new(ResponseBody::StackTrace(StackTraceResponse {
                    total_frames: Some(stack_frames.len() as i64),
                    stack_frames,
                }))
            }
            Command::Scopes(_) => Reply::new(ResponseBody::Scopes(ScopesResponse {
                scopes: vec![scope("Stack", STACK_REFERENCE), scope("Scratch", SCRATCH_REFERENCE)],
            })),
            Command::Variables(args) => {
                debug!(?args, "Received Variables request");
                Reply::new(ResponseBody::Variables(VariablesResponse {
                    variables: self.variables(args.variables_reference),
                }))
            }
            Command::Continue(_) => {
                debug!("Received Continue request");
                let events = self.run_to_breakpoint()?;
                Reply::new(ResponseBody::Continue(ContinueResponse {
                    all_threads_continued: Some(true),
                }))
                .with_events(events)
            }
            Command::Next(_) => Reply::new(ResponseBody::Next).with_events(self.step(Replay::step)?),
            Command::StepIn(_) => Reply::new(ResponseBody::StepIn).with_events(self.step(Replay::step)?),
            Command::StepOut(_) => Reply::new(ResponseBody::StepOut).with_events(self.step(Replay::step_out)?),
            Command::Evaluate(args) => {
                debug!(?args, "Received Evaluate request");
                let (result, type_field) = self.evaluate(&args.expression)?;
                Reply::new(ResponseBody::Evaluate(EvaluateResponse {
                    result,
                    type_field: Some(type_field),
                    variables_reference: 0,
                    named_variables: None,
                    indexed_variables: None,
                    presentation_hint: None,
                    memory_reference: None,
                }))
            }
            Command::Disconnect(_) => {
                info!("Received Disconnect request");
                self.replay = None;
                Reply {
                    flow: ControlFlow::Break(()),
                    ..Reply::new(ResponseBody::Disconnect)
                }
            }
            command => return Err(AdapterError::UnhandledCommand(command.clone())),
        };

        Ok(reply)
    }

    fn launch(&mut self, args: LaunchArgs) -> Result<(), AdapterError> {
        self.program = args.program.or_else(|| self.config.program.clone());
        self.stop_on_entry = args.stop_on_entry.or(self.config.stop_on_entry).unwrap_or(false);

        if let Some(path) = &self.program {
            let source = fs::read_to_string(path).map_err(|source| AdapterError::ProgramError {
                path: path.clone(),
                source,
            })?;
            let assembly = teal_asm::assemble(&source);
            if let Some(failure) = &assembly.failure {
                warn!(path = %path.display(), %failure, "Program does not assemble cleanly");
            }
            self.source_map = assembly.source_map;
        }

        let response = self.trace()?;
        let replay = Replay::from_response(&response);
        info!(
            groups = response.txn_groups.len(),
            finished = replay.is_finished(),
            "Loaded execution trace"
        );
        self.replay = Some(replay);
        Ok(())
    }

    fn trace(&self) -> Result<SimulateResponse, AdapterError> {
        if let Some(recorded) = &self.recorded {
            return Ok(recorded.clone());
        }

        let endpoint = match (&self.live, &self.config.algod) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, Some(algod)) => {
                LiveEndpoint::parse(&algod.address, &algod.token).map_err(AdapterError::TraceUnavailable)?
            }
            (None, None) => {
                return Err(AdapterError::TraceUnavailable(
                    "no replay file or algod endpoint configured".to_string(),
                ));
            }
        };

        let request = self.config.simulate.as_ref().ok_or_else(|| {
            AdapterError::TraceUnavailable("live mode requires a `simulate` request in the debug config".to_string())
        })?;

        Ok(AlgodClient::new(endpoint)?.simulate(request)?)
    }

    /// Starts execution once the adapter is both launched and configured.
    fn start(&mut self) -> Vec<Event> {
        let Some(pc) = self.replay.as_ref().and_then(Replay::pc) else {
            return vec![terminated()];
        };

        if self.stop_on_entry {
            vec![stopped(types::StoppedEventReason::Entry, pc)]
        } else if self.is_breakpoint(pc) {
            vec![stopped(types::StoppedEventReason::Breakpoint, pc)]
        } else {
            self.run_to_breakpoint().unwrap_or_default()
        }
    }

    fn run_to_breakpoint(&mut self) -> Result<Vec<Event>, AdapterError> {
        let (source_map, breakpoints) = (&self.source_map, &self.breakpoints);
        let replay = self.replay.as_mut().ok_or(AdapterError::NotLaunched)?;

        let hit = replay.resume(|pc| is_breakpoint(source_map, breakpoints, pc));
        Ok(match replay.pc() {
            Some(pc) if hit => vec![stopped(types::StoppedEventReason::Breakpoint, pc)],
            _ => vec![terminated()],
        })
    }

    fn step(&mut self, advance: fn(&mut Replay) -> bool) -> Result<Vec<Event>, AdapterError> {
        let replay = self.replay.as_mut().ok_or(AdapterError::NotLaunched)?;

        advance(replay);
        Ok(match replay.pc() {
            Some(pc) => vec![stopped(types::StoppedEventReason::Step, pc)],
            None => vec![terminated()],
        })
    }

    fn is_breakpoint(&self, pc: u64) -> bool {
        is_breakpoint(&self.source_map, &self.breakpoints, pc)
    }

    fn source(&self) -> Option<types::Source> {
        self.program.as_ref().map(|path| types::Source {
            name: path.file_name().map(|n| n.to_string_lossy().to_string()),
            path: Some(path.to_string_lossy().to_string()),
            adapter_data: None,
            source_reference: None,
            presentation_hint: None,
            origin: None,
            checksums: None,
            sources: None,
        })
    }

    fn stack_frames(&self) -> Vec<types::StackFrame> {
        let Some(replay) = &self.replay else {
            return Vec::new();
        };
        let (Some(pc), Some(label)) = (replay.pc(), replay.segment_label()) else {
            return Vec::new();
        };

        let line = usize::try_from(pc)
            .ok()
            .and_then(|pc| self.source_map.line_for_pc(pc))
            .unwrap_or_default();

        vec![types::StackFrame {
            id: 0,
            name: format!("{} pc {}", label, pc),
            line: line as i64,
            column: 1,
            source: self.source(),
            ..Default::default()
        }]
    }

    fn variables(&self, reference: i64) -> Vec<types::Variable> {
        let Some(replay) = &self.replay else {
            return Vec::new();
        };

        match reference {
            STACK_REFERENCE => replay
                .stack()
                .iter()
                .enumerate()
                .map(|(i, value)| variable(i.to_string(), value, format!("stack[{}]", i)))
                .collect(),
            SCRATCH_REFERENCE => replay
                .scratch()
                .iter()
                .map(|(slot, value)| variable(slot.to_string(), value, format!("scratch[{}]", slot)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Evaluates `pc`, `stack[N]` or `scratch[N]` against the current step.
    fn evaluate(&self, expression: &str) -> Result<(String, String), AdapterError> {
        let replay = self.replay.as_ref().ok_or(AdapterError::NotLaunched)?;
        let expression = expression.trim();

        if expression == "pc" {
            let pc = replay
                .pc()
                .ok_or_else(|| AdapterError::EvaluationError("execution has finished".to_string()))?;
            return Ok((pc.to_string(), "uint64".to_string()));
        }

        let indexed = |prefix: &str| {
            expression
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('['))
                .and_then(|rest| rest.strip_suffix(']'))
                .and_then(|index| index.trim().parse::<u64>().ok())
        };

        let value = if let Some(index) = indexed("stack") {
            usize::try_from(index).ok().and_then(|i| replay.stack().get(i))
        } else if let Some(slot) = indexed("scratch") {
            replay.scratch().get(&slot)
        } else {
            return Err(AdapterError::EvaluationError(format!(
                "unsupported expression {:?}",
                expression
            )));
        };

        value
            .map(|v| (v.to_string(), v.type_name().to_string()))
            .ok_or_else(|| AdapterError::EvaluationError(format!("{} is not set", expression)))
    }
}

fn is_breakpoint(source_map: &SourceMap, breakpoints: &BTreeSet<usize>, pc: u64) -> bool {
    usize::try_from(pc)
        .ok()
        .and_then(|pc| source_map.line_for_pc(pc))
        .is_some_and(|line| breakpoints.contains(&line))
}

fn stopped(reason: types::StoppedEventReason, pc: u64) -> Event {
    Event::Stopped(events::StoppedEventBody {
        reason,
        description: Some(format!("Paused at pc {}", pc)),
        thread_id: Some(THREAD_ID),
        preserve_focus_hint: None,
        text: None,
        all_threads_stopped: Some(true),
        hit_breakpoint_ids: None,
    })
}

fn terminated() -> Event {
    Event::Terminated(Some(events::TerminatedEventBody {
        restart: Some(serde_json::Value::Bool(false)),
    }))
}

fn scope(name: &str, variables_reference: i64) -> types::Scope {
    types::Scope {
        name: name.to_string(),
        variables_reference,
        expensive: false,
        named_variables: None,
        indexed_variables: None,
        source: None,
        line: None,
        column: None,
        end_line: None,
        end_column: None,
        presentation_hint: None,
    }
}

fn variable(name: String, value: &AvmValue, evaluate_name: String) -> types::Variable {
    types::Variable {
        name,
        value: value.to_string(),
        type_field: Some(value.type_name().to_string()),
        variables_reference: 0,
        named_variables: None,
        indexed_variables: None,
        presentation_hint: None,
        evaluate_name: Some(evaluate_name),
        memory_reference: None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufReader, BufWriter, Cursor};

    use dap::server::Server;

    use super::*;
    use crate::protocol::{ExecTrace, OpcodeTrace, ScratchChange, TxnGroupResult, TxnResult};

    const PROGRAM: &str = "#pragma version 8\nint 1\nint 2\n+\nstore 0\nload 0\nreturn\n";

    fn op(pc: u64, pop: u64, push: Vec<AvmValue>) -> OpcodeTrace {
        OpcodeTrace {
            pc,
            stack_pop_count: pop,
            stack_additions: push,
            scratch_changes: Vec::new(),
        }
    }

    fn recorded() -> SimulateResponse {
        let trace = vec![
            op(1, 0, vec![AvmValue::uint(1)]),
            op(3, 0, vec![AvmValue::uint(2)]),
            op(5, 2, vec![AvmValue::uint(3)]),
            OpcodeTrace {
                scratch_changes: vec![ScratchChange {
                    slot: 0,
                    new_value: AvmValue::uint(3),
                }],
                ..op(6, 1, Vec::new())
            },
            op(8, 0, vec![AvmValue::uint(3)]),
            op(10, 1, Vec::new()),
        ];

        SimulateResponse {
            txn_groups: vec![TxnGroupResult {
                txn_results: vec![TxnResult {
                    exec_trace: Some(ExecTrace {
                        approval_program_trace: trace,
                        ..Default::default()
                    }),
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn launch_command(program: &std::path::Path, stop_on_entry: bool) -> Command {
        let args = LaunchArgs {
            program: Some(program.to_path_buf()),
            stop_on_entry: Some(stop_on_entry),
        };
        Command::Launch(dap::requests::LaunchRequestArguments {
            no_debug: None,
            restart_data: None,
            additional_data: Some(serde_json::to_value(args).unwrap()),
        })
    }

    #[allow(deprecated)]
    fn set_breakpoints_command(lines: &[i64]) -> Command {
        Command::SetBreakpoints(dap::requests::SetBreakpointsArguments {
            source: types::Source {
                name: Some("approval.teal".to_string()),
                path: None,
                adapter_data: None,
                source_reference: None,
                presentation_hint: None,
                origin: None,
                checksums: None,
                sources: None,
            },
            breakpoints: Some(
                lines
                    .iter()
                    .map(|line| types::SourceBreakpoint {
                        line: *line,
                        column: None,
                        condition: None,
                        hit_condition: None,
                        log_message: None,
                    })
                    .collect(),
            ),
            lines: None,
            source_modified: None,
        })
    }

    fn continue_command() -> Command {
        Command::Continue(dap::requests::ContinueArguments {
            thread_id: THREAD_ID,
            single_thread: None,
        })
    }

    fn next_command() -> Command {
        Command::Next(dap::requests::NextArguments {
            thread_id: THREAD_ID,
            single_thread: None,
            granularity: None,
        })
    }

    fn evaluate_command(expression: &str) -> Command {
        Command::Evaluate(dap::requests::EvaluateArguments {
            expression: expression.to_string(),
            frame_id: None,
            context: None,
            format: None,
        })
    }

    fn stop_reason(events: &[Event]) -> Option<&types::StoppedEventReason> {
        match events {
            [Event::Stopped(body)] => Some(&body.reason),
            _ => None,
        }
    }

    fn is_terminated(events: &[Event]) -> bool {
        matches!(events, [Event::Terminated(_)])
    }

    fn evaluate(adapter: &mut TealAdapter, expression: &str) -> String {
        match adapter.execute(&evaluate_command(expression)).ok().map(|r| r.body) {
            Some(ResponseBody::Evaluate(response)) => response.result,
            _ => panic!("evaluate {} failed", expression),
        }
    }

    /// Launches a replay of [`PROGRAM`] with breakpoints on `lines`.
    fn launched(stop_on_entry: bool, lines: &[i64]) -> (TealAdapter, tempfile::TempDir, Vec<Event>) {
        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("approval.teal");
        fs::write(&program, PROGRAM).unwrap();

        let mut adapter = TealAdapter::default();
        adapter.set_replay(recorded());
        assert!(adapter.execute(&launch_command(&program, stop_on_entry)).is_ok());
        assert!(adapter.execute(&set_breakpoints_command(lines)).is_ok());
        let events = adapter.execute(&Command::ConfigurationDone).ok().unwrap().events;

        (adapter, dir, events)
    }

    #[test]
    fn test_initialize_sends_initialized_event() {
        let mut adapter = TealAdapter::default();
        let reply = adapter
            .execute(&Command::Initialize(dap::requests::InitializeArguments {
                client_id: None,
                client_name: None,
                adapter_id: "teal".to_string(),
                locale: None,
                lines_start_at1: None,
                columns_start_at1: None,
                path_format: None,
                supports_variable_type: None,
                supports_variable_paging: None,
                supports_run_in_terminal_request: None,
                supports_memory_references: None,
                supports_progress_reporting: None,
                supports_invalidated_event: None,
                supports_memory_event: None,
                supports_args_can_be_interpreted_by_shell: None,
                supports_start_debugging_request: None,
            }))
            .ok()
            .unwrap();

        assert!(matches!(reply.body, ResponseBody::Initialize(_)));
        assert!(matches!(reply.events.as_slice(), [Event::Initialized]));
    }

    #[test]
    fn test_stop_on_entry() {
        let (mut adapter, _dir, events) = launched(true, &[]);

        assert!(matches!(stop_reason(&events), Some(types::StoppedEventReason::Entry)));
        assert_eq!(evaluate(&mut adapter, "pc"), "1");
    }

    #[test]
    fn test_run_to_breakpoint_and_inspect() {
        let (mut adapter, _dir, events) = launched(false, &[4]);

        assert!(matches!(stop_reason(&events), Some(types::StoppedEventReason::Breakpoint)));
        assert_eq!(evaluate(&mut adapter, "pc"), "5");
        assert_eq!(evaluate(&mut adapter, "stack[1]"), "2");

        let Some(ResponseBody::StackTrace(trace)) = adapter
            .execute(&Command::StackTrace(dap::requests::StackTraceArguments {
                thread_id: THREAD_ID,
                start_frame: None,
                levels: None,
                format: None,
            }))
            .ok()
            .map(|r| r.body)
        else {
            panic!("expected a stack trace");
        };
        assert_eq!(trace.stack_frames.len(), 1);
        assert_eq!(trace.stack_frames[0].name, "group 0 txn 0 approval pc 5");
        assert_eq!(trace.stack_frames[0].line, 4);
        assert_eq!(
            trace.stack_frames[0].source.as_ref().and_then(|s| s.name.clone()),
            Some("approval.teal".to_string())
        );
    }

    #[test]
    fn test_step_updates_scratch_and_terminates() {
        let (mut adapter, _dir, _) = launched(false, &[5]);
        assert_eq!(evaluate(&mut adapter, "pc"), "6");

        let events = adapter.execute(&next_command()).ok().unwrap().events;
        assert!(matches!(stop_reason(&events), Some(types::StoppedEventReason::Step)));
        assert_eq!(evaluate(&mut adapter, "scratch[0]"), "3");

        let Some(ResponseBody::Variables(variables)) = adapter
            .execute(&Command::Variables(dap::requests::VariablesArguments {
                variables_reference: SCRATCH_REFERENCE,
                filter: None,
                start: None,
                count: None,
                format: None,
            }))
            .ok()
            .map(|r| r.body)
        else {
            panic!("expected variables");
        };
        assert_eq!(variables.variables.len(), 1);
        assert_eq!(variables.variables[0].value, "3");
        assert_eq!(variables.variables[0].type_field.as_deref(), Some("uint64"));

        let events = adapter.execute(&continue_command()).ok().unwrap().events;
        assert!(is_terminated(&events));
    }

    #[test]
    fn test_no_breakpoints_runs_to_termination() {
        let (_, _dir, events) = launched(false, &[]);
        assert!(is_terminated(&events));
    }

    #[test]
    fn test_breakpoints_on_lines_without_instructions_are_unverified() {
        let (mut adapter, _dir, _) = launched(true, &[]);

        let Some(ResponseBody::SetBreakpoints(response)) = adapter
            .execute(&set_breakpoints_command(&[1, 3, 42]))
            .ok()
            .map(|r| r.body)
        else {
            panic!("expected breakpoints");
        };

        let verified = response.breakpoints.iter().map(|b| b.verified).collect::<Vec<_>>();
        assert_eq!(verified, vec![false, true, false]);
    }

    #[test]
    fn test_step_out_terminates_single_segment() {
        let (mut adapter, _dir, _) = launched(true, &[]);

        let events = adapter
            .execute(&Command::StepOut(dap::requests::StepOutArguments {
                thread_id: THREAD_ID,
                single_thread: None,
                granularity: None,
            }))
            .ok()
            .unwrap()
            .events;

        assert!(is_terminated(&events));
    }

    #[test]
    fn test_launch_before_configuration_done_waits() {
        let mut adapter = TealAdapter::default();
        adapter.set_replay(recorded());

        let reply = adapter
            .execute(&Command::Launch(dap::requests::LaunchRequestArguments {
                no_debug: None,
                restart_data: None,
                additional_data: None,
            }))
            .ok()
            .unwrap();

        assert!(reply.events.is_empty());
        assert!(adapter.is_launched());
    }

    #[test]
    fn test_live_mode_without_simulate_request_fails_launch() {
        let mut adapter = TealAdapter::default();
        adapter.set_live(LiveEndpoint::parse("http://localhost:4001", "").unwrap());

        let result = adapter.execute(&Command::Launch(dap::requests::LaunchRequestArguments {
            no_debug: None,
            restart_data: None,
            additional_data: None,
        }));

        assert!(matches!(result, Err(AdapterError::TraceUnavailable(_))));
        assert!(!adapter.is_launched());
    }

    #[test]
    fn test_launch_with_missing_program() {
        let mut adapter = TealAdapter::default();
        adapter.set_replay(recorded());

        let result = adapter.execute(&launch_command(std::path::Path::new("/no/such/program.teal"), false));
        assert!(matches!(result, Err(AdapterError::ProgramError { .. })));
    }

    #[test]
    fn test_requests_before_launch() {
        let mut adapter = TealAdapter::default();

        assert!(matches!(adapter.execute(&continue_command()), Err(AdapterError::NotLaunched)));
        assert!(matches!(
            adapter.execute(&evaluate_command("pc")),
            Err(AdapterError::NotLaunched)
        ));
    }

    #[test]
    fn test_evaluate_errors() {
        let (mut adapter, _dir, _) = launched(true, &[]);

        assert!(matches!(
            adapter.execute(&evaluate_command("stack[7]")),
            Err(AdapterError::EvaluationError(_))
        ));
        assert!(matches!(
            adapter.execute(&evaluate_command("global")),
            Err(AdapterError::EvaluationError(_))
        ));
    }

    #[test]
    fn test_disconnect_breaks_the_loop() {
        let mut adapter = TealAdapter::default();
        let reply = adapter
            .execute(&Command::Disconnect(dap::requests::DisconnectArguments {
                restart: None,
                terminate_debuggee: None,
                suspend_debuggee: None,
            }))
            .ok()
            .unwrap();

        assert!(reply.flow.is_break());
    }

    #[test]
    fn test_handle_request_answers_failures_with_error_response() {
        let mut adapter = TealAdapter::default();
        let input = BufReader::new(Cursor::new(Vec::new()));
        let output = BufWriter::new(Cursor::new(Vec::new()));
        let mut server = Server::new(input, output);

        let req = Request {
            seq: 1,
            command: Command::Pause(dap::requests::PauseArguments { thread_id: THREAD_ID }),
        };

        let flow = adapter.handle_request(req, &mut server).unwrap();
        assert!(flow.is_continue());
    }

    #[test]
    fn test_send_log_output() {
        let adapter = TealAdapter::default();
        let input = BufReader::new(Cursor::new(Vec::new()));
        let output = BufWriter::new(Cursor::new(Vec::new()));
        let mut server = Server::new(input, output);

        assert!(adapter.send_log_output("Test message", &mut server).is_ok());
    }
}
