use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::config::LabConfig;
use crate::ctx::Ctx;
use crate::error::ExecError;
use crate::llm::LlmClient;
use crate::stage::{Capability, Role, Stage, StageSequence};
use crate::tools::{self, SearchClient, search};

/// Something that can carry a stage sequence through to a final answer.
///
/// The whole sequence is one unit: either the last stage's output comes
/// back, or the first failure does.
pub trait ExecutionService {
    fn kickoff(&mut self, stages: &StageSequence) -> Result<String, ExecError>;
}

impl<E: ExecutionService + ?Sized> ExecutionService for Box<E> {
    fn kickoff(&mut self, stages: &StageSequence) -> Result<String, ExecError> {
        (**self).kickoff(stages)
    }
}

/// Passed to the `on_stage` hook after each completed stage.
pub struct StageEvent<'a> {
    pub role: Role,
    pub stage_number: usize,
    pub duration: Duration,
    pub output: &'a str,
}

/// Passed to the `on_error` hook when a stage fails.
pub struct ErrorEvent<'a> {
    pub role: Role,
    pub stage_number: usize,
    pub error: &'a ExecError,
}

/// The five lab workers, run one after another against the model.
pub struct Crew {
    llm: LlmClient,
    search: Option<SearchClient>,
    on_stage: Option<Box<dyn FnMut(&StageEvent)>>,
    on_error: Option<Box<dyn FnMut(&ErrorEvent)>>,
}

impl Crew {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            search: None,
            on_stage: None,
            on_error: None,
        }
    }

    /// Model client from the config, plus web search when a Serper key is set.
    pub fn from_config(config: &LabConfig) -> Self {
        let crew = Self::new(LlmClient::from_config(config));
        match &config.serper_api_key {
            Some(key) => crew.with_search(SearchClient::new(key).with_timeout(config.request_timeout)),
            None => crew,
        }
    }

    pub fn with_search(mut self, search: SearchClient) -> Self {
        self.search = Some(search);
        self
    }

    /// Register a callback that fires after each completed stage.
    pub fn on_stage(mut self, cb: impl FnMut(&StageEvent) + 'static) -> Self {
        self.on_stage = Some(Box::new(cb));
        self
    }

    /// Register a callback that fires when a stage fails.
    pub fn on_error(mut self, cb: impl FnMut(&ErrorEvent) + 'static) -> Self {
        self.on_error = Some(Box::new(cb));
        self
    }

    /// Set both hooks to emit `tracing` events.
    pub fn with_tracing(self) -> Self {
        self.on_stage(|e| {
            info!(
                stage = e.stage_number,
                role = %e.role,
                secs = e.duration.as_secs_f64(),
                chars = e.output.len(),
                "stage complete"
            );
        })
        .on_error(|e| {
            error!(stage = e.stage_number, role = %e.role, error = %e.error, "stage failed");
        })
    }

    fn tool_notes(&self, stage: &Stage, stages: &StageSequence) -> Vec<String> {
        let mut notes = Vec::new();
        for capability in stage.role.capabilities() {
            match capability {
                Capability::FileRead => {
                    let Some(path) = stages.protocol_file() else {
                        continue;
                    };
                    match tools::read_file(path) {
                        Ok(text) => notes.push(format!(
                            "Protocol file {}:\n{}",
                            path.display(),
                            text.trim()
                        )),
                        Err(e) => {
                            warn!(path = %path.display(), error = %e, "protocol file unreadable");
                            notes.push(format!("Protocol file {} could not be read: {e}", path.display()));
                        }
                    }
                }
                Capability::WebSearch => {
                    let Some(client) = &self.search else {
                        debug!(role = %stage.role, "web search not configured");
                        continue;
                    };
                    let Some(query) = search::query_for(stages.experiment()) else {
                        continue;
                    };
                    match client.search(&query) {
                        Ok(hits) if hits.is_empty() => {
                            notes.push(format!("Web search for \"{query}\" returned no results."));
                        }
                        Ok(hits) => notes.push(format!(
                            "Web search for \"{query}\":\n{}",
                            search::format_hits(&hits)
                        )),
                        Err(e) => {
                            warn!(query = %query, error = %e, "web search failed");
                            notes.push(format!("Web search for \"{query}\" failed: {e}"));
                        }
                    }
                }
            }
        }
        notes
    }

    fn run_stage(&self, stage: &Stage, stages: &StageSequence, ctx: &Ctx) -> Result<String, ExecError> {
        let notes = self.tool_notes(stage, stages);
        let prompt = stage.prompt(ctx.previous_output(stage.role), &notes);
        debug!(role = %stage.role, prompt_chars = prompt.len(), "dispatching stage");

        let output = ctx
            .llm()
            .system(stage.role.system_prompt())
            .user(prompt)
            .send()?;

        if output.trim().is_empty() {
            return Err(ExecError::malformed(format!("{} produced no output", stage.role)));
        }
        Ok(output)
    }
}

impl ExecutionService for Crew {
    fn kickoff(&mut self, stages: &StageSequence) -> Result<String, ExecError> {
        let mut ctx = Ctx::new(self.llm.clone());

        for (idx, stage) in stages.iter().enumerate() {
            let stage_number = idx + 1;
            let start = Instant::now();
            let result = self.run_stage(stage, stages, &ctx);
            let duration = start.elapsed();

            match result {
                Err(err) => {
                    if let Some(cb) = &mut self.on_error {
                        cb(&ErrorEvent {
                            role: stage.role,
                            stage_number,
                            error: &err,
                        });
                    }
                    return Err(err);
                }
                Ok(output) => {
                    if let Some(cb) = &mut self.on_stage {
                        cb(&StageEvent {
                            role: stage.role,
                            stage_number,
                            duration,
                            output: &output,
                        });
                    }
                    ctx.record(stage.role, output);
                }
            }
        }

        let last = stages.stages()[stages.len() - 1].role;
        ctx.output(last)
            .map(str::to_string)
            .ok_or_else(|| ExecError::unknown("crew finished without a final report"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::stage::build_pipeline;
    use std::sync::{Arc, Mutex};

    fn offline_crew() -> Crew {
        let llm = LlmClient::new(Some("k".into()), "gemini-pro")
            .with_api_base("http://localhost:1")
            .with_timeout(Duration::from_secs(5));
        Crew::new(llm)
    }

    #[test]
    fn missing_key_fails_at_first_stage() {
        let mut crew = Crew::new(LlmClient::new(None, "gemini-pro"));
        let err = crew.kickoff(&build_pipeline("x")).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Auth);
    }

    #[test]
    fn on_error_fires_once_with_first_role() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let mut crew = offline_crew().on_error(move |e| {
            seen_clone.lock().unwrap().push((e.role, e.stage_number));
        });

        let err = crew.kickoff(&build_pipeline("x")).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Network);
        assert_eq!(*seen.lock().unwrap(), vec![(Role::ProtocolRead, 1)]);
    }

    #[test]
    fn on_stage_not_fired_when_first_stage_fails() {
        let count = Arc::new(Mutex::new(0usize));
        let count_clone = Arc::clone(&count);

        let mut crew = offline_crew().on_stage(move |_e| {
            *count_clone.lock().unwrap() += 1;
        });

        let _ = crew.kickoff(&build_pipeline("x"));
        assert_eq!(*count.lock().unwrap(), 0);
    }

    // --- full run against a local stub ---

    /// One request seen by the stub: request line, api key header, JSON body.
    struct Seen {
        request_line: String,
        api_key: Option<String>,
        body: serde_json::Value,
    }

    fn read_request(stream: &mut std::net::TcpStream) -> Seen {
        use std::io::{BufRead, BufReader, Read};

        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut content_length = None;
        let mut chunked = false;
        let mut api_key = None;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(':').unwrap();
            let value = value.trim();
            match name.to_ascii_lowercase().as_str() {
                "content-length" => content_length = Some(value.parse::<usize>().unwrap()),
                "transfer-encoding" => chunked = value.eq_ignore_ascii_case("chunked"),
                "x-goog-api-key" => api_key = Some(value.to_string()),
                _ => {}
            }
        }

        let mut body = Vec::new();
        if chunked {
            loop {
                let mut size = String::new();
                reader.read_line(&mut size).unwrap();
                let size = usize::from_str_radix(size.trim(), 16).unwrap();
                let mut chunk = vec![0; size + 2];
                reader.read_exact(&mut chunk).unwrap();
                if size == 0 {
                    break;
                }
                body.extend_from_slice(&chunk[..size]);
            }
        } else {
            body.resize(content_length.unwrap_or(0), 0);
            reader.read_exact(&mut body).unwrap();
        }

        Seen {
            request_line,
            api_key,
            body: serde_json::from_slice(&body).unwrap(),
        }
    }

    /// Serve `answers` in order, one connection each, reporting every request.
    fn spawn_model_stub(answers: Vec<String>) -> (String, std::sync::mpsc::Receiver<Seen>) {
        use std::io::Write;

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = std::sync::mpsc::channel();

        std::thread::spawn(move || {
            for answer in answers {
                let (mut stream, _) = listener.accept().unwrap();
                let seen = read_request(&mut stream);
                tx.send(seen).unwrap();

                let body = serde_json::json!({
                    "candidates": [{ "content": { "parts": [{ "text": answer }] } }]
                })
                .to_string();
                write!(
                    stream,
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
                stream.flush().unwrap();
            }
        });

        (base, rx)
    }

    #[test]
    fn five_stages_chain_outputs_and_return_report() {
        let answers: Vec<String> = (1..=5).map(|n| format!("ANSWER{n}")).collect();
        let (base, requests) = spawn_model_stub(answers);

        let completed = Arc::new(Mutex::new(Vec::new()));
        let completed_clone = Arc::clone(&completed);
        let llm = LlmClient::new(Some("test-key".into()), "gemini-pro")
            .with_api_base(base)
            .with_timeout(Duration::from_secs(10));
        let mut crew = Crew::new(llm).on_stage(move |e| {
            completed_clone
                .lock()
                .unwrap()
                .push((e.role, e.stage_number, e.output.to_string()));
        });

        let out = crew.kickoff(&build_pipeline("Test caffeine on yeast growth"));
        assert_eq!(out.unwrap(), "ANSWER5");

        let seen: Vec<Seen> = requests.try_iter().collect();
        assert_eq!(seen.len(), 5);

        for (i, (req, role)) in seen.iter().zip(Role::ALL).enumerate() {
            assert!(req.request_line.starts_with("POST "), "{}", req.request_line);
            assert!(req.request_line.contains("/models/gemini-pro:generateContent"));
            assert_eq!(req.api_key.as_deref(), Some("test-key"));

            let system = req.body["systemInstruction"]["parts"][0]["text"].as_str().unwrap();
            assert_eq!(system, role.system_prompt());

            let user = req.body["contents"][0]["parts"][0]["text"].as_str().unwrap();
            if i == 0 {
                assert!(user.contains("Test caffeine on yeast growth"));
                assert!(!user.contains("ANSWER"));
            } else {
                assert!(user.contains(&format!("ANSWER{i}")), "stage {} missing ANSWER{i}", i + 1);
            }
        }

        let completed = completed.lock().unwrap();
        let roles: Vec<Role> = completed.iter().map(|(r, _, _)| *r).collect();
        assert_eq!(roles, Role::ALL);
        assert_eq!(completed[4], (Role::Report, 5, "ANSWER5".to_string()));
    }

    // --- tool notes ---

    #[test]
    fn file_read_note_for_protocol_reader_only() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("protocol.md");
        std::fs::write(&path, "Step 1: thaw cells").unwrap();

        let seq = build_pipeline("x").with_protocol_file(&path);
        let crew = offline_crew();

        let notes = crew.tool_notes(&seq.stages()[0], &seq);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("Step 1: thaw cells"));

        for stage in &seq.stages()[1..] {
            assert!(crew.tool_notes(stage, &seq).is_empty(), "{} got notes", stage.role);
        }
    }

    #[test]
    fn unreadable_protocol_becomes_a_note() {
        let seq = build_pipeline("x").with_protocol_file("/nonexistent_dir_xyz/protocol.md");
        let notes = offline_crew().tool_notes(&seq.stages()[0], &seq);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("could not be read"));
    }

    #[test]
    fn failed_search_becomes_a_note() {
        let crew = offline_crew().with_search(
            SearchClient::new("key")
                .with_endpoint("http://localhost:1/search")
                .with_timeout(Duration::from_secs(5)),
        );
        let seq = build_pipeline("Screen XYZ-123 on HeLa cells");
        let notes = crew.tool_notes(&seq.stages()[1], &seq);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("Web search for \"Screen XYZ-123 on HeLa cells\" failed"));
    }

    #[test]
    fn no_search_client_means_no_note() {
        let seq = build_pipeline("x");
        assert!(offline_crew().tool_notes(&seq.stages()[1], &seq).is_empty());
    }

    #[test]
    fn boxed_service_forwards() {
        struct Fixed;
        impl ExecutionService for Fixed {
            fn kickoff(&mut self, _stages: &StageSequence) -> Result<String, ExecError> {
                Ok("OK".into())
            }
        }

        let mut boxed: Box<dyn ExecutionService> = Box::new(Fixed);
        assert_eq!(boxed.kickoff(&build_pipeline("x")).unwrap(), "OK");
    }
}
