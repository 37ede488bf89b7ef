use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use upsc_exam_engine::clients::{GeminiClient, LopdfExtractor, PageExtractor};
use upsc_exam_engine::models::{AuditReport, Difficulty, LibraryIndex, OptionKey, QuizAttempt};
use upsc_exam_engine::services::{add_to_library, HistoryStore};
use upsc_exam_engine::utils::{format_statements, read_json_or_default};
use upsc_exam_engine::utils::logging::{log_startup, truncate_text};
use upsc_exam_engine::workflow::{AppState, QuizSession};
use upsc_exam_engine::{logger, Config};

type App = AppState<GeminiClient, LopdfExtractor>;

#[derive(Parser, Debug)]
#[command(name = "upsc-exam", version, about = "UPSC Prelims question generator and practice tool")]
struct Cli {
    /// Gemini API Key（优先于 GEMINI_API_KEY）
    #[arg(long, global = true)]
    api_key: Option<String>,
    /// TOML 配置文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct QuizArgs {
    /// 难度: Fundamental / Applied / Advanced / UPSC Actual
    #[arg(short, long)]
    difficulty: Option<String>,
    /// 交卷后导出成绩单到此路径
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 按主题练习
    Practice {
        topic: String,
        #[arg(short = 'n', long)]
        num_questions: Option<usize>,
        /// 以该 PDF 的全文作为出题资料
        #[arg(long)]
        source: Option<PathBuf>,
        #[command(flatten)]
        quiz: QuizArgs,
    },
    /// 覆盖八个科目的模拟考试
    Mock {
        #[arg(short = 'n', long, default_value_t = 20)]
        total: usize,
        #[command(flatten)]
        quiz: QuizArgs,
    },
    /// 资料库管理
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },
    /// 测验历史
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// 生成一套题并请模型审核质量
    Audit {
        topic: String,
        #[arg(short = 'n', long)]
        num_questions: Option<usize>,
        #[arg(short, long)]
        difficulty: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum LibraryAction {
    /// 扫描资料库目录并更新索引
    Scan,
    /// 按学科列出已索引的书籍与章节
    List,
    /// 把 PDF 复制进资料库（同名文件跳过）
    Add {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// 以某一章为资料出题
    Quiz {
        filename: String,
        chapter: u32,
        #[arg(short = 'n', long)]
        num_questions: Option<usize>,
        #[command(flatten)]
        quiz: QuizArgs,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryAction {
    /// 列出历史记录（最新在前）
    List,
    /// 重做某次测验
    Replay {
        id: String,
        #[command(flatten)]
        quiz: QuizArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env 不存在时忽略
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?.with_api_key(cli.api_key);
    logger::init(cli.verbose || config.verbose_logging);
    log_startup(&config);

    // 不调用模型的命令不需要 API Key
    match &cli.command {
        Command::History {
            action: HistoryAction::List,
        } => {
            print_history(&HistoryStore::new(config.history_file.clone()).load().await);
            return Ok(());
        }
        Command::Library {
            action: LibraryAction::List,
        } => {
            let index: LibraryIndex = read_json_or_default(&config.index_file).await;
            print_library(index, &config.library_dir);
            return Ok(());
        }
        Command::Library {
            action: LibraryAction::Add { files },
        } => {
            for line in add_to_library(&config.library_dir, files).await {
                println!("{}", line);
            }
            return Ok(());
        }
        _ => {}
    }

    let mut app = App::from_config(config)?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    match cli.command {
        Command::Practice {
            topic,
            num_questions,
            source,
            quiz,
        } => {
            let difficulty = resolve_difficulty(&app, quiz.difficulty.as_deref());
            let n = num_questions.unwrap_or(app.config().num_questions);
            let source_text = match source {
                Some(path) => Some(read_source(&path)?),
                None => None,
            };
            app.start_topic_practice(&topic, difficulty, n, source_text).await?;
            run_quiz(&mut app, &mut input, quiz.report.as_deref()).await?;
        }
        Command::Mock { total, quiz } => {
            let difficulty = resolve_difficulty(&app, quiz.difficulty.as_deref());
            let (_, errors) = app.start_mock_test(total, difficulty).await?;
            if !errors.is_empty() {
                println!("⚠️ 部分科目生成失败:");
                for error in &errors {
                    println!("  - {}", error);
                }
            }
            run_quiz(&mut app, &mut input, quiz.report.as_deref()).await?;
        }
        Command::Library { action } => match action {
            LibraryAction::Scan => {
                for line in app.scan_library().await {
                    println!("{}", line);
                }
            }
            LibraryAction::List => {
                print_library(app.librarian().load_index().await, app.librarian().library_dir())
            }
            LibraryAction::Add { files } => {
                for line in app.add_to_library(&files).await {
                    println!("{}", line);
                }
            }
            LibraryAction::Quiz {
                filename,
                chapter,
                num_questions,
                quiz,
            } => {
                let difficulty = resolve_difficulty(&app, quiz.difficulty.as_deref());
                let n = num_questions.unwrap_or(app.config().num_questions);
                app.start_chapter_quiz(&filename, chapter, difficulty, n).await?;
                run_quiz(&mut app, &mut input, quiz.report.as_deref()).await?;
            }
        },
        Command::History { action } => match action {
            HistoryAction::List => print_history(&app.history().load().await),
            HistoryAction::Replay { id, quiz } => {
                app.replay(&id).await?;
                run_quiz(&mut app, &mut input, quiz.report.as_deref()).await?;
            }
        },
        Command::Audit {
            topic,
            num_questions,
            difficulty,
        } => {
            let difficulty = resolve_difficulty(&app, difficulty.as_deref());
            let n = num_questions.unwrap_or(app.config().num_questions);
            app.start_topic_practice(&topic, difficulty, n, None).await?;
            if let Some(session) = app.session() {
                print_questions(session);
            }
            let report = app.audit_current().await?;
            print_audit(&report);
        }
    }

    Ok(())
}

fn resolve_difficulty(app: &App, label: Option<&str>) -> Difficulty {
    match label {
        Some(label) => Difficulty::from_label(label).unwrap_or_else(|| {
            warn!("未知难度 '{}'，使用 {}", label, Difficulty::default().label());
            Difficulty::default()
        }),
        None => app.config().difficulty,
    }
}

fn read_source(path: &Path) -> Result<String> {
    let text = LopdfExtractor
        .extract_pages(path, 1, None)
        .with_context(|| format!("无法读取资料 {}", path.display()))?;
    info!("📖 已读取资料 {} ({} 字符)", path.display(), text.chars().count());
    Ok(text)
}

/// 逐题作答：输入 A-D 作答，回车跳过，q 提前交卷
async fn run_quiz(app: &mut App, input: &mut Lines<BufReader<Stdin>>, report: Option<&Path>) -> Result<()> {
    let Some(session) = app.session() else {
        return Ok(());
    };
    let questions = session.questions.clone();
    println!("\n📝 {} ({} 题, {})\n", session.topic, questions.len(), session.difficulty.label());

    'questions: for (i, question) in questions.iter().enumerate() {
        println!("Q{}. {}", i + 1, format_statements(&question.question_text));
        for (key, text) in &question.options {
            println!("   ({}) {}", key, text);
        }

        loop {
            println!("你的答案 [A-D, 回车跳过, q 交卷]: ");
            let Some(line) = input.next_line().await? else {
                break 'questions;
            };
            let line = line.trim();
            if line.eq_ignore_ascii_case("q") {
                break 'questions;
            }
            if line.is_empty() {
                break;
            }
            match OptionKey::parse(line) {
                Some(choice) => {
                    app.answer(i + 1, Some(choice))?;
                    break;
                }
                None => println!("请输入 A、B、C 或 D"),
            }
        }
        println!();
    }

    let score = app.submit().await?;
    println!(
        "🏆 得分 {:.2} / {} (正确 {}, 错误 {}, 未答 {})\n",
        score.score, score.max_score, score.correct, score.wrong, score.skipped
    );
    if let Some(session) = app.session() {
        print_review(session);
    }

    if let Some(path) = report {
        app.export_report(path).await?;
        println!("📄 成绩单已导出到 {}", path.display());
    }
    Ok(())
}

fn print_questions(session: &QuizSession) {
    for (i, question) in session.questions.iter().enumerate() {
        println!("Q{}. {}", i + 1, format_statements(&question.question_text));
        for (key, text) in &question.options {
            println!("   ({}) {}", key, text);
        }
        println!("   ✔ {}\n", question.correct_option);
    }
}

fn print_review(session: &QuizSession) {
    for (i, question) in session.questions.iter().enumerate() {
        let answer = session.answers.get(i).copied().flatten();
        let mark = match answer {
            Some(a) if a == question.correct_option => "✅",
            Some(_) => "❌",
            None => "➖",
        };
        println!(
            "{} Q{}: 你的答案 {}, 正确答案 {}",
            mark,
            i + 1,
            answer.map_or("-", OptionKey::as_str),
            question.correct_option
        );
        if !question.explanation.is_empty() {
            println!("   {}", question.explanation);
        }
    }
}

fn print_library(index: LibraryIndex, library_dir: &Path) {
    let grouped = index.grouped_by_subject();
    if grouped.is_empty() {
        println!("资料库为空，请把 PDF 放入 {} 后运行 `library scan`", library_dir.display());
        return;
    }
    for (subject, books) in grouped {
        println!("📚 {}", subject);
        for book in books {
            println!("  📘 {}", book.filename);
            for chapter in book.chapters {
                let (start, end) = chapter.page_range();
                let end = end.map_or_else(|| "end".to_string(), |e| e.to_string());
                println!("     {:>2}. {} (p.{}-{})", chapter.index, chapter.title, start, end);
            }
        }
    }
}

fn print_history(history: &[QuizAttempt]) {
    if history.is_empty() {
        println!("暂无历史记录");
        return;
    }
    for attempt in history {
        println!(
            "{}  {}  {:<40}  {:.2}/{}  ({} 题)",
            attempt.id,
            attempt.timestamp,
            truncate_text(&attempt.topic, 37),
            attempt.score,
            attempt.max_score,
            attempt.questions.len()
        );
    }
}

fn print_audit(report: &AuditReport) {
    println!("🧐 审核结论: {} (评分 {:.1}/10)", report.verdict, report.overall_score);
    for strength in &report.strengths {
        println!("  + {}", strength);
    }
    for issue in &report.issues {
        println!("  - Q{}: {}", issue.question_index + 1, issue.issue);
    }
}
