use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::thread::JoinHandle;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::errors::GemelliError;

pub mod messages {
    use serde::{Deserialize, Serialize};

    use crate::aligner::tables::AlignState;

    #[derive(Debug, Serialize, Deserialize)]
    pub enum DebugOutputMessage {
        Empty,
        NewAlignment { name_x: String, name_y: String, m: usize, n: usize },
        ScoreTable { state: AlignState, tsv: String },
        PredecessorTable { state: AlignState, tsv: String },
        Terminate,
    }
}

/// Streams per-alignment table snapshots to files in a directory, written
/// by a background worker thread so the aligner never blocks on disk.
pub struct DebugOutputWriter {
    transmitter: Sender<messages::DebugOutputMessage>,
    worker: DebugOutputWorker,
}

impl DebugOutputWriter {
    pub fn new<T: AsRef<Path> + Send>(debug_output_dir: T) -> Self {
        let (tx, rx) = unbounded();

        Self { transmitter: tx, worker: DebugOutputWorker::new(debug_output_dir, rx) }
    }

    pub fn log(&self, msg: messages::DebugOutputMessage) {
        if let Err(e) = self.transmitter.send(msg) {
            eprintln!("Could not log debug message!\nCause:{}", e)
        }
    }

    pub fn join(self) -> Result<(), GemelliError> {
        self.worker.join()
    }
}

fn write_msg(writer: &mut impl Write, msg: &messages::DebugOutputMessage) {
    match serde_json::to_string(&msg) {
        Ok(json) => {
            if let Err(e) = writeln!(writer, "{}", json) {
                eprintln!("Error writing message to debug output!\n{}", e);
            }
        },
        Err(e) => eprintln!("Could not serialize debug data to JSON!\n{}", e)
    }
}

struct DebugOutputWorker {
    thread: JoinHandle<Result<(), GemelliError>>,
}

impl DebugOutputWorker {
    fn new<T: AsRef<Path> + Send>(debug_output_dir: T, receiver: Receiver<messages::DebugOutputMessage>) -> Self {
        let output_path = debug_output_dir.as_ref().to_path_buf();
        Self { thread: std::thread::spawn(move || {
            eprintln!("DEBUG: log output directory {:?}", output_path);
            std::fs::create_dir_all(&output_path)?;

            let mut curr_run = "none".to_string();

            for msg in receiver {
                match msg {
                    messages::DebugOutputMessage::Empty => (),
                    messages::DebugOutputMessage::NewAlignment { ref name_x, ref name_y, m: _, n: _ } => {
                        curr_run = format!("{name_x}_vs_{name_y}");
                        let mut output_file = File::create(output_path.join(format!("{curr_run}.txt")))
                            .map(BufWriter::new)?;

                        write_msg(&mut output_file, &msg);
                    },
                    messages::DebugOutputMessage::ScoreTable { state, ref tsv } => {
                        let tag = ["M", "I", "D"][state.index()];
                        let fname = output_path.join(format!("{curr_run}_{tag}_score.tsv"));
                        let mut tsv_file = File::create(fname)?;
                        writeln!(tsv_file, "{}", tsv)?
                    },
                    messages::DebugOutputMessage::PredecessorTable { state, ref tsv } => {
                        let tag = ["M", "I", "D"][state.index()];
                        let fname = output_path.join(format!("{curr_run}_{tag}_prev.tsv"));
                        let mut tsv_file = File::create(fname)?;
                        writeln!(tsv_file, "{}", tsv)?
                    },
                    messages::DebugOutputMessage::Terminate => break
                }
            }

            Ok(())
        })}
    }

    fn join(self) -> Result<(), GemelliError> {
        self.thread.join().unwrap()
    }
}
