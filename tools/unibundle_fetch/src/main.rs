#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::process::Command;
use std::{fs, io};

use clap::Parser;
use serde::Deserialize;

/// Encoding variants tried in order for every bundle.
const SUFFIXES: [&str; 2] = [".sd", ".ld"];

type DynError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(name = "unibundle_fetch")]
#[command(about = "Download asset bundles from a CDN asset server")]
struct Args {
	/// Asset server base URL, including the trailing slash.
	#[arg(long)]
	asset_server: String,
	/// Client platform segment of the bundle URL.
	#[arg(long, default_value = "webgl")]
	platform: String,
	/// Client version segment of the bundle URL.
	#[arg(long)]
	client_version: String,
	/// Asset bundle version segment of the bundle URL.
	#[arg(long)]
	bundle_version: String,
	/// Directory receiving `<bundle_path>.bundle` files.
	#[arg(long, default_value = "bundles")]
	out: PathBuf,
	/// JSON file listing `bundles` and `icons` to fetch.
	#[arg(long)]
	list: Option<PathBuf>,
	/// Icon file names mapped to their image bundles.
	#[arg(long = "icon")]
	icons: Vec<String>,
	/// Print planned downloads without performing network requests.
	#[arg(long)]
	dry_run: bool,
	/// Re-download files even when the target already exists.
	#[arg(long)]
	overwrite: bool,
	/// Bundle paths relative to the version directory, without suffix.
	bundles: Vec<String>,
}

/// Contents of a `--list` file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FetchList {
	bundles: Vec<String>,
	icons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FetchItem {
	bundle_path: String,
	url_prefix: String,
	destination: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchOutcome {
	Downloaded(&'static str),
	SkippedExists,
}

/// Running totals printed after the last bundle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Summary {
	downloaded: usize,
	skipped: usize,
}

impl Summary {
	fn record(&mut self, outcome: FetchOutcome) {
		match outcome {
			FetchOutcome::Downloaded(_) => self.downloaded += 1,
			FetchOutcome::SkippedExists => self.skipped += 1,
		}
	}
}

/// Moves one URL into a local file.
trait Transport {
	fn get(&self, url: &str, destination: &Path) -> Result<(), DynError>;
}

/// External download programs, tried in order until one is installed.
#[derive(Debug, Clone, Copy)]
enum Tool {
	Curl,
	Wget,
}

impl Tool {
	const ALL: [Self; 2] = [Self::Curl, Self::Wget];

	fn name(self) -> &'static str {
		match self {
			Self::Curl => "curl",
			Self::Wget => "wget",
		}
	}

	fn command(self, url: &str, destination: &Path) -> Command {
		let mut command = Command::new(self.name());
		match self {
			Self::Curl => command.args(["--fail", "--location", "--silent", "--show-error", "--output"]),
			Self::Wget => command.args(["--quiet", "--output-document"]),
		};
		command.arg(destination).arg(url);
		command
	}
}

/// Shells out to the first available [`Tool`].
struct ExternalTool;

impl Transport for ExternalTool {
	fn get(&self, url: &str, destination: &Path) -> Result<(), DynError> {
		for tool in Tool::ALL {
			match tool.command(url, destination).status() {
				Ok(status) if status.success() => return Ok(()),
				Ok(status) => return Err(format!("{} exited with status {status} for {url}", tool.name()).into()),
				Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
				Err(err) => return Err(format!("failed to run {}: {err}", tool.name()).into()),
			}
		}
		Err("neither `curl` nor `wget` is available; install one to fetch bundles".into())
	}
}

fn main() {
	if let Err(err) = run(Args::parse()) {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run(args: Args) -> Result<(), DynError> {
	let mut list = match &args.list {
		Some(path) => load_fetch_list(path)?,
		None => FetchList::default(),
	};
	list.bundles.extend(args.bundles.iter().cloned());
	list.icons.extend(args.icons.iter().cloned());

	let base = bundle_base_url(&args.asset_server, &args.platform, &args.client_version, &args.bundle_version);
	let plan = build_fetch_plan(&list, &base, &args.out)?;
	if plan.is_empty() {
		println!("No bundles requested.");
		return Ok(());
	}

	if args.dry_run {
		println!("Dry run: {} bundle(s) planned into {}", plan.len(), args.out.display());
		for item in &plan {
			println!("PLAN\t{}\t<=\t{}{{{}}}", item.destination.display(), item.url_prefix, SUFFIXES.join(","));
		}
		return Ok(());
	}

	let mut summary = Summary::default();
	for item in &plan {
		let outcome = fetch_bundle(&ExternalTool, item, args.overwrite)
			.map_err(|err| format!("failed fetching {} to {}: {err}", item.bundle_path, item.destination.display()))?;
		match outcome {
			FetchOutcome::Downloaded(suffix) => println!("GET\t{}\t<=\t{}{suffix}", item.destination.display(), item.url_prefix),
			FetchOutcome::SkippedExists => println!("SKIP\t{}", item.destination.display()),
		}
		summary.record(outcome);
	}

	println!(
		"Done. downloaded={} skipped={} out={}",
		summary.downloaded,
		summary.skipped,
		args.out.display()
	);
	Ok(())
}

fn load_fetch_list(path: &Path) -> Result<FetchList, DynError> {
	let bytes = fs::read(path)?;
	Ok(serde_json::from_slice::<FetchList>(&bytes)?)
}

/// Directory URL holding every bundle of one client and bundle version.
fn bundle_base_url(asset_server: &str, platform: &str, client_version: &str, bundle_version: &str) -> String {
	format!("{asset_server}bundles/{platform}/default/{client_version}/{bundle_version}/")
}

/// Bundle path holding an icon image file.
fn icon_bundle_path(icon_file: &str) -> String {
	let separator = if icon_file.starts_with('/') { "" } else { "_" };
	format!("images{separator}{}", icon_file.replace('/', "_").replacen(".png", "", 1))
}

fn build_fetch_plan(list: &FetchList, base: &str, out: &Path) -> Result<Vec<FetchItem>, DynError> {
	let paths = list.bundles.iter().cloned().chain(list.icons.iter().map(|icon| icon_bundle_path(icon)));

	let mut plan: Vec<FetchItem> = Vec::new();
	for bundle_path in paths {
		check_bundle_path(&bundle_path)?;
		if plan.iter().any(|item| item.bundle_path == bundle_path) {
			continue;
		}
		plan.push(FetchItem {
			url_prefix: format!("{base}{bundle_path}"),
			destination: out.join(format!("{bundle_path}.bundle")),
			bundle_path,
		});
	}

	Ok(plan)
}

/// Bundle paths are `/`-separated names below the version directory; they double as paths under `--out`.
fn check_bundle_path(path: &str) -> Result<(), DynError> {
	if path.is_empty() {
		return Err("empty bundle path".into());
	}
	if path.starts_with('/') {
		return Err(format!("rooted bundle path '{path}' is not allowed").into());
	}
	for segment in path.split('/') {
		match segment {
			"" | "." => return Err(format!("empty segment in bundle path '{path}'").into()),
			".." => return Err(format!("parent path traversal '{path}' is not allowed").into()),
			_ if segment.contains(['\\', ':']) => return Err(format!("bundle path '{path}' contains a drive or backslash").into()),
			_ => {}
		}
	}
	Ok(())
}

/// Fetch one bundle, trying each suffix in turn. A failed attempt leaves no file behind.
fn fetch_bundle(transport: &impl Transport, item: &FetchItem, overwrite: bool) -> Result<FetchOutcome, DynError> {
	if item.destination.exists() && !overwrite {
		return Ok(FetchOutcome::SkippedExists);
	}

	if let Some(parent) = item.destination.parent() {
		fs::create_dir_all(parent)?;
	}

	let mut failures = Vec::with_capacity(SUFFIXES.len());
	for suffix in SUFFIXES {
		let url = format!("{}{suffix}", item.url_prefix);
		match transport.get(&url, &item.destination) {
			Ok(()) => return Ok(FetchOutcome::Downloaded(suffix)),
			Err(err) => {
				let _ = fs::remove_file(&item.destination);
				failures.push(err.to_string());
			}
		}
	}

	Err(failures.join("; ").into())
}
