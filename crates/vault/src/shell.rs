//! Interactive line-oriented front end.
//!
//! The shell starts on the login screen and, once unlocked, shows one
//! directory listing at a time. Every error is printed and the prompt comes
//! back; only end of input or `quit` leaves the loop.

use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::Result;
use model::PreferenceKey;
use storage::KeychainBackend;

use crate::app::Vault;
use crate::auth::{LoginFlow, LoginOutcome};
use crate::preferences::PreferenceStore;
use crate::view::DirectoryView;

const HELP: &str = "\
Commands:
  ls                       list the current folder
  cd <name> | cd ..        open a folder / go up
  mkdir <name>             create a folder
  write <name> <text...>   create a text file
  import <name> <file>     import an image from the local file system
  cat <name>               print a text file
  mv <name> <new-name>     rename an entry
  rm [-r] <name>           delete an entry
  sort                     toggle ascending/descending order
  size                     toggle file sizes
  settings                 show preferences
  passwd                   change the vault password
  help                     show this help
  quit                     leave";

/// What the documents loop asks the outer loop to do next.
enum Next {
    Continue,
    Relogin,
    Quit,
}

/// Interactive session over a line reader and a writer.
pub struct Shell<'v, B: KeychainBackend, S: PreferenceStore, R: BufRead, W: Write> {
    vault: &'v Vault<B, S>,
    input: R,
    output: W,
}

impl<'v, B, S, R, W> Shell<'v, B, S, R, W>
where
    B: KeychainBackend,
    S: PreferenceStore,
    R: BufRead,
    W: Write,
{
    pub fn new(vault: &'v Vault<B, S>, input: R, output: W) -> Self {
        Self {
            vault,
            input,
            output,
        }
    }

    /// Run until `quit` or end of input.
    pub fn run(&mut self) -> Result<()> {
        let mut flow = LoginFlow::new(self.vault.gate());

        loop {
            if !self.login(&mut flow)? {
                return Ok(());
            }

            let mut view = match self.vault.open_view(Path::new("")) {
                Ok(view) => view,
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    return Ok(());
                }
            };

            match self.documents(&mut view)? {
                Next::Quit => return Ok(()),
                Next::Relogin => {
                    if let Err(e) = self.vault.gate().remove() {
                        writeln!(self.output, "Error: {}", e)?;
                    }
                    flow.reset(self.vault.gate());
                }
                Next::Continue => {}
            }
        }
    }

    /// Drive the login screen. Returns false at end of input.
    fn login(&mut self, flow: &mut LoginFlow) -> Result<bool> {
        let mut shown = None;
        loop {
            let mode = flow.mode();
            if shown != Some(mode.title()) {
                writeln!(self.output, "== {} ==", mode.title())?;
                shown = Some(mode.title());
            }

            let Some(line) = self.prompt(&format!("{} [{}]: ", mode.prompt(), mode.action_label()))?
            else {
                return Ok(false);
            };

            let outcome = flow.submit(self.vault.gate(), &line);
            if let Some(message) = outcome.error_message() {
                writeln!(self.output, "{}", message)?;
            }
            match outcome {
                LoginOutcome::Unlocked => {
                    writeln!(self.output, "Unlocked.")?;
                    return Ok(true);
                }
                LoginOutcome::Mismatch | LoginOutcome::Failed(_) => shown = None,
                _ => {}
            }
        }
    }

    /// The documents screen loop.
    fn documents(&mut self, view: &mut DirectoryView) -> Result<Next> {
        self.print_listing(view)?;

        loop {
            if view.poll_changes() {
                self.print_listing(view)?;
            }

            let prompt = format!("{}> ", view.location().display());
            let Some(line) = self.prompt(&prompt)? else {
                return Ok(Next::Quit);
            };

            match self.execute(view, line.trim()) {
                Ok(Next::Continue) => {}
                Ok(next) => return Ok(next),
                Err(e) => writeln!(self.output, "Error: {}", e)?,
            }
        }
    }

    fn execute(&mut self, view: &mut DirectoryView, line: &str) -> Result<Next> {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "help" | "?" => writeln!(self.output, "{}", HELP)?,
            "ls" => {
                view.refresh();
                self.print_listing(view)?;
            }
            "cd" => match rest {
                ".." => {
                    if !view.up() {
                        writeln!(self.output, "Already at the documents root")?;
                    }
                    self.print_listing(view)?;
                }
                "" => anyhow::bail!("usage: cd <name>"),
                name => {
                    view.enter(name)?;
                    self.print_listing(view)?;
                }
            },
            "mkdir" => {
                view.create_folder(rest)?;
                self.print_listing(view)?;
            }
            "write" => {
                let (name, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                view.create_text_file(name, text.trim_start())?;
                self.print_listing(view)?;
            }
            "import" => {
                let Some((name, source)) = rest.split_once(char::is_whitespace) else {
                    anyhow::bail!("usage: import <name> <file>");
                };
                let bytes = fs::read(source.trim())?;
                view.create_image_file(name, &bytes)?;
                self.print_listing(view)?;
            }
            "cat" => {
                let text = view.read_text(rest)?;
                writeln!(self.output, "{}", text)?;
            }
            "mv" => {
                let Some((name, new_name)) = rest.split_once(char::is_whitespace) else {
                    anyhow::bail!("usage: mv <name> <new-name>");
                };
                view.rename(name, new_name.trim())?;
                self.print_listing(view)?;
            }
            "rm" => {
                let (recursive, name) = match rest.strip_prefix("-r") {
                    Some(name) if name.starts_with(char::is_whitespace) => (true, name.trim()),
                    _ => (false, rest),
                };
                view.delete(name, recursive)?;
                self.print_listing(view)?;
            }
            "sort" => {
                let ascending = self.vault.preferences().toggle(PreferenceKey::Sort)?;
                writeln!(
                    self.output,
                    "Sort: {}",
                    if ascending { "ascending" } else { "descending" }
                )?;
            }
            "size" => {
                let shown = self.vault.preferences().toggle(PreferenceKey::Size)?;
                writeln!(self.output, "Size: {}", if shown { "on" } else { "off" })?;
            }
            "settings" => self.print_settings()?,
            "passwd" => return Ok(Next::Relogin),
            "quit" | "exit" => return Ok(Next::Quit),
            other => writeln!(self.output, "Unknown command: {} (try `help`)", other)?,
        }

        Ok(Next::Continue)
    }

    fn print_listing(&mut self, view: &DirectoryView) -> Result<()> {
        writeln!(self.output, "[{}]", view.title())?;
        let rows = view.rows();
        if rows.is_empty() {
            writeln!(self.output, "  (empty)")?;
        }
        for row in rows {
            writeln!(self.output, "  {}", row)?;
        }
        Ok(())
    }

    fn print_settings(&mut self) -> Result<()> {
        for key in PreferenceKey::ALL {
            let value = self.vault.preferences().get(key);
            writeln!(self.output, "{}: {}", key.label(), if value { "on" } else { "off" })?;
        }
        Ok(())
    }

    /// Print `prompt` and read one line. `None` at end of input.
    fn prompt(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}
