use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use timetable_planner::config::PlannerConfig;
use timetable_planner::ledger::BookingLedger;
use timetable_planner::orchestrator::{self, RunRequest};
use timetable_planner::rng::PlannerRng;
use timetable_planner::source::{
    InMemoryAssignmentSink, InMemoryEntitySource, JsonDirEntitySource, TerminalSink,
};
use timetable_planner::types::{
    CanonicalCourseGroup, CanonicalId, Course, CourseId, FacultyId, Lecturer, LecturerId,
    LecturerRole, Program, ProgramId, Room, RoomId, RoomType,
};

#[derive(Parser)]
#[command(name = "timetable-planner")]
#[command(about = "CSP + guided genetic algorithm university timetable planner")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the demo with in-memory sample data
    Demo {
        /// Faculty to plan for
        #[arg(long, default_value = "ENG")]
        faculty: String,

        /// Term to solve (1 or 2)
        #[arg(long, default_value_t = 1)]
        term: u8,

        /// Discard any previously committed bookings for this faculty first
        #[arg(long)]
        regenerate: bool,

        /// Seed for the deterministic RNG
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },

    /// Plan a term from a directory of entity JSON files
    Plan {
        /// Directory containing programs.json, courses.json, lecturers.json,
        /// rooms.json, and (optionally) canonical_groups.json
        #[arg(short, long)]
        data: PathBuf,

        /// Faculty to plan for
        #[arg(long)]
        faculty: String,

        /// Term to solve (1 or 2)
        #[arg(long, default_value_t = 1)]
        term: u8,

        /// Academic year label, e.g. "2025-2026"
        #[arg(long)]
        academic_year: String,

        /// Discard any previously committed bookings for this faculty first
        #[arg(long)]
        regenerate: bool,

        /// Seed for the deterministic RNG
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Planner config file (TOML); falls back to defaults when absent
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            faculty,
            term,
            regenerate,
            seed,
        } => run_demo(&faculty, term, regenerate, seed),
        Commands::Plan {
            data,
            faculty,
            term,
            academic_year,
            regenerate,
            seed,
            config,
        } => run_plan(&data, &faculty, term, &academic_year, regenerate, seed, config.as_deref()),
    }
}

fn run_demo(faculty: &str, term: u8, regenerate: bool, seed: u64) -> Result<()> {
    println!("{}", "Timetable Planner Demo".bold().cyan());
    println!("{}", "─".repeat(40));

    let source = demo_source();
    let mut sink = InMemoryAssignmentSink::new();
    let mut ledger = BookingLedger::new(term, "2025-2026");
    let mut config = PlannerConfig::default();
    config.gga_population_size = 60;
    config.gga_max_generations = 80;
    config.validate().context("default planner config is invalid")?;

    let cancelled = Arc::new(AtomicBool::new(false));
    let mut progress = TerminalSink::new(cancelled);
    let mut rng = PlannerRng::from_seed(seed);
    let faculty_id = FacultyId(faculty.to_string());

    let request = RunRequest {
        term,
        faculty: &faculty_id,
        academic_year: "2025-2026",
        regenerate,
    };

    let report = orchestrator::run(
        &source,
        &mut sink,
        &mut ledger,
        &mut progress,
        &config,
        &mut rng,
        &request,
    )?;

    print_report(&report);
    if report.success {
        print_assignments(&sink);
    }
    Ok(())
}

fn run_plan(
    data: &PathBuf,
    faculty: &str,
    term: u8,
    academic_year: &str,
    regenerate: bool,
    seed: u64,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let source = JsonDirEntitySource::new(data.clone());
    let mut sink = InMemoryAssignmentSink::new();
    let mut ledger = BookingLedger::new(term, academic_year);

    let config = match config_path {
        Some(path) => PlannerConfig::load_or_default(path)?,
        None => PlannerConfig::default(),
    };
    config.validate().context("planner config is invalid")?;

    let cancelled = Arc::new(AtomicBool::new(false));
    let mut progress = TerminalSink::new(cancelled);
    let mut rng = PlannerRng::from_seed(seed);
    let faculty_id = FacultyId(faculty.to_string());

    let request = RunRequest {
        term,
        faculty: &faculty_id,
        academic_year,
        regenerate,
    };

    let report = orchestrator::run(
        &source,
        &mut sink,
        &mut ledger,
        &mut progress,
        &config,
        &mut rng,
        &request,
    )
    .context("planner run failed")?;

    print_report(&report);
    if report.success {
        print_assignments(&sink);
    }
    Ok(())
}

fn print_report(report: &orchestrator::RunReport) {
    println!();
    if report.success {
        println!(
            "{} {} session(s) scheduled in {} ms, fitness {:.3}",
            "✓".green().bold(),
            report.sessions_count,
            report.elapsed_ms,
            report.final_fitness
        );
    } else {
        println!(
            "{} run did not complete: {}",
            "✗".red().bold(),
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    for warning in &report.warnings {
        println!("{} {}", "warning:".yellow(), warning);
    }
}

fn print_assignments(sink: &InMemoryAssignmentSink) {
    println!("\n{}", "Scheduled sessions:".bold());
    let mut records = sink.records.clone();
    records.sort_by(|a, b| (a.day, a.period).cmp(&(b.day, b.period)));
    for record in &records {
        println!(
            "  {} {:?} p{} — course {} — lecturer {} — room {}",
            record.storage_id, record.day, record.period, record.course_id, record.lecturer_id, record.room_number
        );
    }
}

/// Builds a small two-program, four-course sample roster so `demo` runs
/// without any input files on disk.
fn demo_source() -> InMemoryEntitySource {
    let eng = FacultyId("ENG".to_string());

    let programs = vec![
        Program {
            id: ProgramId("BIT-S1".to_string()),
            batch_label: "2025".to_string(),
            code: "BIT".to_string(),
            semester: "S1".to_string(),
            term: None,
            cohort_size: 45,
            course_ids: vec![
                CourseId("CS101".to_string()),
                CourseId("CS102".to_string()),
                CourseId("MA101".to_string()),
            ],
            faculty: eng.clone(),
        },
        Program {
            id: ProgramId("BCS-S1".to_string()),
            batch_label: "2025".to_string(),
            code: "BCS".to_string(),
            semester: "S1".to_string(),
            term: None,
            cohort_size: 38,
            course_ids: vec![
                CourseId("CS101".to_string()),
                CourseId("CS103".to_string()),
                CourseId("MA101".to_string()),
            ],
            faculty: eng.clone(),
        },
    ];

    let courses = vec![
        Course {
            id: CourseId("CS101".to_string()),
            code: "CS101".to_string(),
            name: "Introduction to Programming".to_string(),
            weekly_hours: 4,
            credits: 3,
            preferred_room_type: RoomType::Lab,
            preferred_term: Some(1),
            course_group: Some("intro-programming".to_string()),
            canonical_id: Some("CANON-INTRO-PROG".to_string()),
        },
        Course {
            id: CourseId("CS102".to_string()),
            code: "CS102".to_string(),
            name: "Discrete Mathematics".to_string(),
            weekly_hours: 3,
            credits: 3,
            preferred_room_type: RoomType::Theory,
            preferred_term: Some(1),
            course_group: None,
            canonical_id: None,
        },
        Course {
            id: CourseId("CS103".to_string()),
            code: "CS103".to_string(),
            name: "Computer Organization".to_string(),
            weekly_hours: 3,
            credits: 3,
            preferred_room_type: RoomType::Theory,
            preferred_term: Some(1),
            course_group: None,
            canonical_id: None,
        },
        Course {
            id: CourseId("MA101".to_string()),
            code: "MA101".to_string(),
            name: "Calculus I".to_string(),
            weekly_hours: 4,
            credits: 4,
            preferred_room_type: RoomType::Theory,
            preferred_term: Some(1),
            course_group: None,
            canonical_id: Some("CANON-CALC-1".to_string()),
        },
    ];

    let lecturers = vec![
        Lecturer {
            id: LecturerId("L-ADA".to_string()),
            name: "Dr. Ada Osei".to_string(),
            role: LecturerRole::FullTime,
            specializations: vec!["CS101".to_string(), "CS103".to_string()],
            availability: None,
            sessions_per_day: 3,
            max_weekly_hours: None,
        },
        Lecturer {
            id: LecturerId("L-KOF".to_string()),
            name: "Mr. Kofi Mensah".to_string(),
            role: LecturerRole::FullTime,
            specializations: vec!["CS102".to_string(), "MA101".to_string()],
            availability: None,
            sessions_per_day: 3,
            max_weekly_hours: None,
        },
        Lecturer {
            id: LecturerId("L-AMA".to_string()),
            name: "Dr. Ama Darko".to_string(),
            role: LecturerRole::Dean,
            specializations: vec!["MA101".to_string()],
            availability: None,
            sessions_per_day: 2,
            max_weekly_hours: None,
        },
    ];

    let rooms = vec![
        Room {
            id: RoomId("LAB-1".to_string()),
            room_number: "LAB-1".to_string(),
            capacity: 50,
            room_type: RoomType::Lab,
            available: true,
        },
        Room {
            id: RoomId("T-201".to_string()),
            room_number: "T-201".to_string(),
            capacity: 60,
            room_type: RoomType::Theory,
            available: true,
        },
        Room {
            id: RoomId("T-202".to_string()),
            room_number: "T-202".to_string(),
            capacity: 50,
            room_type: RoomType::Theory,
            available: true,
        },
    ];

    let canonical_groups = vec![
        CanonicalCourseGroup {
            canonical_id: CanonicalId("CANON-INTRO-PROG".to_string()),
            display_name: "Introduction to Programming".to_string(),
            equivalent_codes: vec!["CS101".to_string()],
        },
        CanonicalCourseGroup {
            canonical_id: CanonicalId("CANON-CALC-1".to_string()),
            display_name: "Calculus I".to_string(),
            equivalent_codes: vec!["MA101".to_string()],
        },
    ];

    InMemoryEntitySource {
        programs,
        courses,
        lecturers,
        rooms,
        canonical_groups,
    }
}
