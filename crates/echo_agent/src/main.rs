use std::io;
use std::thread;

use echo_agent::commands;
use echo_agent::controller::Controller;
use pinned_tui::{logging, EngineConfig, EnvConfig, ProcessTerminal, TuiEngine};

fn main() -> io::Result<()> {
    let env = EnvConfig::from_env();
    logging::init(&env);
    let config = EngineConfig::default().with_env(&env);

    let terminal = ProcessTerminal::new().with_write_log(config.write_log.clone());
    let (mut engine, events) = TuiEngine::new(terminal, config, commands::catalog());

    let directory = std::env::current_dir()
        .ok()
        .map(|dir| dir.display().to_string());
    let controller = Controller::new(engine.handle(), directory);

    engine.start().map_err(io::Error::other)?;
    controller.greet();
    let worker = thread::spawn(move || controller.run(events));

    engine.run();

    let result = engine.dispose();
    drop(engine);
    if worker.join().is_err() {
        eprintln!("controller thread panicked");
    }
    result.map_err(io::Error::other)
}
