//! CLI (Command Line Interface) mode
//!
//! Interactive REPL that feeds each line to the command interpreter, the
//! same way a messenger message would arrive. Also supports one-shot
//! execution of a single command.

use chrono::{FixedOffset, Utc};
use cb_core::interpreter::RuleTable;
use cb_core::{CommandInterpreter, Instant};
use nu_ansi_term::{Color, Style};
use reedline::{
    ColumnarMenu, Completer, DefaultHinter, Emacs, KeyCode, KeyModifiers, Keybindings, MenuBuilder, Prompt,
    Reedline, ReedlineEvent, ReedlineMenu, Signal, Suggestion,
};
use tracing::info;

/// Slash commands handled by the REPL itself
const SLASH_COMMANDS: &[(&str, &str)] = &[
    ("/help", "도움말 표시"),
    ("/exit", "프로그램 종료"),
    ("/quit", "프로그램 종료"),
    ("/history", "입력한 명령어 보기"),
    ("/clear", "입력 기록 지우기"),
];

/// Completer over slash commands and chat command keywords
#[derive(Clone)]
pub struct CommandCompleter {
    commands: Vec<(String, String)>,
}

impl CommandCompleter {
    pub fn new(rules: &RuleTable) -> Self {
        let mut commands: Vec<(String, String)> = SLASH_COMMANDS
            .iter()
            .map(|(cmd, desc)| (cmd.to_string(), desc.to_string()))
            .collect();

        for rule in rules.rules() {
            let description = rule.usage.trim_start_matches("❌ 사용법: ").to_string();
            for keyword in &rule.keywords {
                if !commands.iter().any(|(cmd, _)| cmd == keyword) {
                    commands.push((keyword.clone(), description.clone()));
                }
            }
        }

        Self { commands }
    }
}

impl Completer for CommandCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let typed = line.get(..pos).unwrap_or(line);
        if typed.trim().is_empty() {
            return Vec::new();
        }

        self.commands
            .iter()
            .filter(|(cmd, _)| cmd.starts_with(typed))
            .map(|(cmd, desc)| Suggestion {
                value: cmd.clone(),
                description: Some(desc.clone()),
                extra: None,
                span: reedline::Span::new(0, pos),
                append_whitespace: true,
                style: None,
            })
            .collect()
    }
}

/// Custom prompt with colored styling
struct ColoredPrompt {
    style: Style,
}

impl ColoredPrompt {
    fn new() -> Self {
        Self {
            style: Color::Cyan.bold(),
        }
    }
}

impl Prompt for ColoredPrompt {
    fn render_prompt_left(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Owned(self.style.paint("📅 > ").to_string())
    }

    fn render_prompt_right(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _prompt_mode: reedline::PromptEditMode) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_multiline_indicator(&self) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }

    fn render_prompt_history_search_indicator(
        &self,
        _history_search: reedline::PromptHistorySearch,
    ) -> std::borrow::Cow<'_, str> {
        std::borrow::Cow::Borrowed("")
    }
}

/// What the REPL should do after a line
#[derive(Debug, PartialEq, Eq)]
enum LineAction {
    /// Handled locally
    Handled,
    Exit,
    /// Not a slash command; goes to the interpreter
    Interpret,
}

/// Run CLI interactive mode
pub async fn run_cli(interpreter: CommandInterpreter, offset: FixedOffset) -> anyhow::Result<()> {
    info!(
        "Starting CLI mode for calendar {}",
        interpreter.settings().calendar_id
    );

    print_welcome();

    let keybindings = default_keybindings();

    // with_only_buffer_difference(false) shows the menu without buffer changes
    let menu = Box::new(
        ColumnarMenu::default()
            .with_name("command_menu")
            .with_columns(1)
            .with_column_width(Some(40))
            .with_only_buffer_difference(false),
    );

    let hinter = DefaultHinter::default().with_style(Style::new().dimmed());

    let mut line_editor = Reedline::create()
        .with_completer(Box::new(CommandCompleter::new(interpreter.rules())))
        .with_menu(ReedlineMenu::EngineCompleter(menu))
        .with_hinter(Box::new(hinter))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    let prompt = ColoredPrompt::new();
    let mut history: Vec<String> = Vec::new();

    loop {
        match line_editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }

                match handle_command(input, &mut history) {
                    LineAction::Handled => continue,
                    LineAction::Exit => {
                        println!("\n👋 안녕히 가세요!\n");
                        break;
                    }
                    LineAction::Interpret => {}
                }

                history.push(input.to_string());
                let reply = interpreter.interpret(input, now(offset)).await;
                println!("\n{}\n", reply);
            }
            Ok(Signal::CtrlC) => {
                println!("^C");
                continue;
            }
            Ok(Signal::CtrlD) => {
                println!("\n👋 안녕히 가세요!\n");
                break;
            }
            Err(err) => {
                eprintln!("\n❌ 오류: {}\n", err);
                break;
            }
        }
    }

    Ok(())
}

/// Run a single command and print the reply
pub async fn run_execute(interpreter: CommandInterpreter, offset: FixedOffset, command: &str) -> anyhow::Result<()> {
    info!("Executing command: {}", command);
    let reply = interpreter.interpret(command.trim(), now(offset)).await;
    println!("{}", reply);
    Ok(())
}

fn now(offset: FixedOffset) -> Instant {
    Utc::now().with_timezone(&offset)
}

/// Default keybindings for reedline
fn default_keybindings() -> Keybindings {
    let mut keybindings = Keybindings::new();

    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::Edit(vec![reedline::EditCommand::Complete]),
    );
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Enter, ReedlineEvent::Submit);
    // Esc closes the completion menu
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Esc, ReedlineEvent::Esc);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('c'), ReedlineEvent::CtrlC);
    keybindings.add_binding(KeyModifiers::CONTROL, KeyCode::Char('d'), ReedlineEvent::CtrlD);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Up, ReedlineEvent::Up);
    keybindings.add_binding(KeyModifiers::NONE, KeyCode::Down, ReedlineEvent::Down);

    keybindings
}

/// Handle REPL slash commands (/help, /exit, /history, /clear)
fn handle_command(input: &str, history: &mut Vec<String>) -> LineAction {
    let lower = input.to_lowercase();
    match lower.as_str() {
        "/exit" | "/quit" | "/q" => LineAction::Exit,
        "/help" | "/?" => {
            print_help();
            LineAction::Handled
        }
        "/history" => {
            print_history(history);
            LineAction::Handled
        }
        "/clear" => {
            history.clear();
            println!("\n✅ 입력 기록을 지웠습니다.\n");
            LineAction::Handled
        }
        _ if lower.starts_with('/') => {
            eprintln!("\n❓ 알 수 없는 명령: {}. /help 로 목록을 확인하세요.\n", input);
            LineAction::Handled
        }
        _ => LineAction::Interpret,
    }
}

fn print_welcome() {
    println!();
    println!("╔══════════════════════════════════════════════╗");
    println!("║           cb-gateway - 캘린더 봇 CLI          ║");
    println!("╚══════════════════════════════════════════════╝");
    println!();
    println!("메신저와 같은 명령어를 입력하세요. /help 로 도움말을 봅니다.");
    println!();
}

fn print_help() {
    println!();
    println!("{}", cb_core::interpreter::render::help());
    println!();
    println!("CLI 명령어:");
    for (cmd, desc) in SLASH_COMMANDS {
        println!("  {:<10} {}", cmd, desc);
    }
    println!();
}

fn print_history(history: &[String]) {
    if history.is_empty() {
        println!("\n(입력 기록 없음)\n");
        return;
    }

    println!();
    for (i, line) in history.iter().enumerate() {
        println!("{:>3}. {}", i + 1, line);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completer() -> CommandCompleter {
        CommandCompleter::new(&RuleTable::default())
    }

    fn values(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.value.as_str()).collect()
    }

    #[test]
    fn test_completer_slash_commands() {
        let mut completer = completer();
        let suggestions = completer.complete("/h", 2);
        assert_eq!(values(&suggestions), vec!["/help", "/history"]);
        assert_eq!(suggestions[0].span.start, 0);
        assert_eq!(suggestions[0].span.end, 2);
    }

    #[test]
    fn test_completer_chat_keywords() {
        let mut completer = completer();
        let suggestions = completer.complete("캘린더 추", "캘린더 추".len());
        assert!(values(&suggestions).contains(&"캘린더 추가"));
        assert!(suggestions
            .iter()
            .all(|s| s.description.as_deref().is_some_and(|d| !d.starts_with("❌"))));
    }

    #[test]
    fn test_completer_ignores_empty_input() {
        let mut completer = completer();
        assert!(completer.complete("", 0).is_empty());
        assert!(completer.complete("  ", 2).is_empty());
    }

    #[test]
    fn test_handle_command() {
        let mut history = vec!["빈시간 내일".to_string()];
        assert_eq!(handle_command("/quit", &mut history), LineAction::Exit);
        assert_eq!(handle_command("/EXIT", &mut history), LineAction::Exit);
        assert_eq!(handle_command("/unknown", &mut history), LineAction::Handled);
        assert_eq!(handle_command("캘린더 조회 오늘", &mut history), LineAction::Interpret);
        assert_eq!(history.len(), 1);

        assert_eq!(handle_command("/clear", &mut history), LineAction::Handled);
        assert!(history.is_empty());
    }
}
