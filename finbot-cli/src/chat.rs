use anyhow::Result;
use finbot_assistant::{Action, ChatService, IntentOracle};
use finbot_core::{MemStorage, UserId};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::state;

/// Daily transcript under ~/.finbot/chat/YYYY-MM-DD.md
struct ChatLog {
    path: PathBuf,
}

impl ChatLog {
    fn open_today() -> Result<Self> {
        let dir = state::ensure_finbot_home()?.join("chat");
        std::fs::create_dir_all(&dir)?;
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        Ok(Self {
            path: dir.join(format!("{today}.md")),
        })
    }

    fn append(&mut self, role: &str, msg: &str) -> Result<()> {
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            f,
            "- {} [{}] {}",
            chrono::Utc::now().to_rfc3339(),
            role,
            msg.replace('\n', " ")
        )?;
        Ok(())
    }
}

const HELP: &str = "Comandos: /help, /sair\n\
Exemplos: \"gastei 50 reais com mercado\", \"recebi 1200 do salário\", \"qual meu saldo?\"";

pub fn run_chat<O: IntentOracle>(service: &ChatService<MemStorage, O>, user_id: UserId) -> Result<()> {
    let mut log = ChatLog::open_today()?;
    log.append("system", "session_start")?;

    println!("FinBot. Digite /help para ajuda ou /sair para terminar.");
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        match line {
            "" => continue,
            "/sair" | "/quit" | "/exit" => break,
            "/help" | "?" => {
                println!("{HELP}");
                continue;
            }
            _ => {}
        }

        log.append("user", line)?;
        match service.handle(user_id, line) {
            Ok(reply) => {
                println!("\n{}\n", reply.response);
                log.append("assistant", &reply.response)?;
                if reply.action == Action::CreateTransaction && reply.transaction_created.is_some() {
                    state::save_ledger(service.storage())?;
                }
            }
            Err(e) => {
                tracing::error!(user_id, error = %e, "chat turn failed");
                println!("Erro: {e:#}");
                log.append("system", &format!("error: {e}"))?;
            }
        }
    }

    log.append("system", "session_end")?;
    Ok(())
}
