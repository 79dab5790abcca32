use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use leaf_doctor::{analyzer, cli, config, error, export, ingest};
use leaf_doctor_common::{build_question_prompt, ReportSection, LEAF_QUIZ};
use analyzer::AnalysisClient;
use cli::{Cli, Commands};
use config::Config;
use error::{LeafDoctorError, Result};
use export::pdf::ReportFont;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match load_config(&cli.command) {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.user_message());
            eprintln!("   {}", e);
            ExitCode::FAILURE
        }
    }
}

/// config コマンドだけは壊れた設定ファイルでも動かす（上書きして直せるように）
fn load_config(command: &Commands) -> Result<Config> {
    if !matches!(command, Commands::Config { .. }) {
        return Config::load();
    }
    let (config, error) = Config::load_or_default_from(&Config::config_path()?);
    if let Some(e) = error {
        eprintln!("⚠ 設定ファイルを読み込めないため既定値で続行します: {}", e);
    }
    Ok(config.with_env(|name| std::env::var(name).ok()))
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "leaf_doctor=debug,warn" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Analyze { image, report, sections, structured, output, title, pdf_quality, wrap, font } => {
            println!("🌱 leaf-doctor - 葉の診断\n");

            // APIキーが無ければここで止める
            let client = AnalysisClient::new(&config)?;

            // 1. 取り込み
            println!("[1/3] 画像を読み込み中...");
            let upload = ingest::load_image(&image)?;
            println!("✔ {} ({} bytes)\n", upload.file_name, upload.bytes.len());

            // 2. 解析
            println!("[2/3] AI解析中...{}", if structured { " (構造化)" } else { "" });
            let spinner = spinner("🔍 Analyzing leaf image...");
            let outcome = analyzer::diagnose(&client, &upload, structured).await;
            spinner.finish_and_clear();
            let (decoded, diagnosis) = outcome?;
            println!("✅ Analysis Complete!\n");

            println!("### 🧬 Disease Analysis Result\n");
            println!("{}\n", diagnosis.analysis);
            if !diagnosis.medicines.is_empty() {
                println!("### 💊 Recommended Medicines");
                for medicine in &diagnosis.medicines {
                    println!("  - {}", medicine);
                }
                println!();
            }
            if let Some(confidence) = diagnosis.confidence {
                println!("モデル申告の信頼度: {:.0}%\n", confidence * 100.0);
            }

            let analyzed_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

            if let Some(output) = output {
                let record = analyzer::build_record(&upload, &decoded, &diagnosis, &analyzed_at);
                let json = serde_json::to_string_pretty(&record)?;
                std::fs::write(&output, json)?;
                println!("✔ 結果を保存: {}", output.display());
            }

            // 3. レポート
            if let Some(report) = report {
                println!("[3/3] レポートを生成中... (品質: {})", pdf_quality);
                let report_font = ReportFont::discover(font.as_deref().or(config.font_path.as_deref()))?;
                match &report_font {
                    Some(f) => println!("  フォント: {}", f.name()),
                    None => println!("  フォント: 標準 (Helvetica, 英字のみ)"),
                }

                let mut extra: Vec<ReportSection> = Vec::new();
                if !diagnosis.medicines.is_empty() {
                    let body = diagnosis
                        .medicines
                        .iter()
                        .map(|m| format!("- {}", m))
                        .collect::<Vec<_>>()
                        .join("\n");
                    extra.push(ReportSection::new("Recommended Medicines", body));
                }
                extra.extend(sections.iter().map(|s| s.to_static().section()));

                let options = export::pdf::ReportOptions {
                    title,
                    subtitle: Some(format!("Generated {} from {}", analyzed_at, upload.file_name)),
                    quality: pdf_quality,
                    wrap_columns: wrap,
                    font: report_font,
                };
                let composed = export::pdf::compose(&decoded, &diagnosis.analysis, &extra, &options)?;

                let output_path = export::report_output_path(report.as_deref());
                export::write_report(&composed.bytes, &output_path)?;
                println!(
                    "✔ PDF出力: {} ({}ページ, {})",
                    output_path.display(),
                    composed.document.page_count(),
                    export::REPORT_MEDIA_TYPE
                );
            }

            println!("\n✅ 完了");
        }

        Commands::Ask { question } => {
            let client = AnalysisClient::new(&config)?;

            match question {
                Some(question) => {
                    let answer = ask_once(&client, &question).await?;
                    println!("{}", answer);
                }
                None => chat_loop(&client).await?,
            }
        }

        Commands::Quiz => {
            println!("🧠 Plant Disease Quiz\n");
            let choice = dialoguer::Select::new()
                .with_prompt(LEAF_QUIZ.question)
                .items(LEAF_QUIZ.options)
                .default(0)
                .interact()?;

            if LEAF_QUIZ.check(choice) {
                println!("✅ Correct! {}", LEAF_QUIZ.explanation);
            } else {
                println!("❌ Not quite. The answer is {}. {}", LEAF_QUIZ.correct_option(), LEAF_QUIZ.explanation);
            }
        }

        Commands::Config { set_api_key, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  ファイル: {}", display_config_path());
                println!("  エンドポイント: {}", config.endpoint);
                println!("  キーの渡し方: {}", if config.key_in_query { "クエリ (?key=)" } else { "Bearerヘッダ" });
                match config.timeout_seconds {
                    Some(secs) => println!("  タイムアウト: {}秒", secs),
                    None => println!("  タイムアウト: なし"),
                }
                match &config.font_path {
                    Some(path) => println!("  PDFフォント: {}", path.display()),
                    None => println!("  PDFフォント: 自動検出"),
                }
                println!("  APIキー: {}", if config.api_key.is_some() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}

async fn ask_once(client: &AnalysisClient, question: &str) -> Result<String> {
    let spinner = spinner("🌿 Thinking...");
    let answer = client.ask(&build_question_prompt(question)).await;
    spinner.finish_and_clear();
    answer
}

/// 対話モード。1問ごとのエラーは表示して続行
async fn chat_loop(client: &AnalysisClient) -> Result<()> {
    println!("🌿 Plant Doctor Chat（空行または exit で終了）\n");
    loop {
        let question: String = dialoguer::Input::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()?;

        let question = question.trim();
        if question.is_empty() || matches!(question, "exit" | "quit") {
            break;
        }

        match ask_once(client, question).await {
            Ok(answer) => println!("\n🌱 {}\n", answer),
            Err(e) => {
                tracing::debug!("ask failed: {:?}", e);
                println!("{}\n   {}\n", e.user_message(), e);
            }
        }
    }
    Ok(())
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn display_config_path() -> String {
    Config::config_path()
        .map(|p: PathBuf| p.display().to_string())
        .unwrap_or_else(|e: LeafDoctorError| e.to_string())
}
