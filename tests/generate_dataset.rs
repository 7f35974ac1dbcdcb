use std::path::PathBuf;

use signalgen::{
    Canvas, GenerateConfig, Generator, ManifestEntry, OutputWriter, TaskType, TypeMix,
};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "signalgen_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn stills_only_config(seed: u64) -> GenerateConfig {
    GenerateConfig {
        canvas: Canvas {
            width: 64,
            height: 64,
        },
        seed: Some(seed),
        generate_videos: false,
        ..GenerateConfig::default()
    }
}

fn read_manifest(path: &std::path::Path) -> Vec<ManifestEntry> {
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[test]
fn batch_writes_layout_and_manifest() {
    let tmp = temp_dir("batch_layout");
    let writer = OutputWriter::new(&tmp, "traffic_light");
    let mut generator = Generator::new(stills_only_config(42)).unwrap();

    let report = generator.generate(12, &writer).unwrap();
    assert_eq!(report.written, 12);
    assert!(report.failures.is_empty());
    assert_eq!(report.per_type.iter().sum::<usize>(), 12);

    let manifest_path = report.manifest_path.unwrap();
    assert!(manifest_path.is_file());
    let entries = read_manifest(&manifest_path);
    assert_eq!(entries.len(), 12);

    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.id, format!("traffic_light_{i:04}"));
        assert_eq!(entry.domain, "traffic_light");
        assert!((1..=4).contains(&entry.task_type));
        assert!(entry.video.is_none());

        let task_dir = writer.task_dir();
        assert!(task_dir.join(&entry.first_frame).is_file());
        assert!(task_dir.join(&entry.final_frame).is_file());
        let prompt = std::fs::read_to_string(task_dir.join(&entry.id).join("prompt.txt")).unwrap();
        assert_eq!(prompt, entry.prompt);
    }

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn same_seed_reproduces_the_dataset() {
    let tmp_a = temp_dir("repro_a");
    let tmp_b = temp_dir("repro_b");
    let writer_a = OutputWriter::new(&tmp_a, "traffic_light");
    let writer_b = OutputWriter::new(&tmp_b, "traffic_light");

    let report_a = Generator::new(stills_only_config(7))
        .unwrap()
        .generate(6, &writer_a)
        .unwrap();
    let report_b = Generator::new(stills_only_config(7))
        .unwrap()
        .generate(6, &writer_b)
        .unwrap();

    let entries_a = read_manifest(&report_a.manifest_path.unwrap());
    let entries_b = read_manifest(&report_b.manifest_path.unwrap());
    assert_eq!(entries_a.len(), entries_b.len());

    for (a, b) in entries_a.iter().zip(&entries_b) {
        assert_eq!(a.task_type, b.task_type);
        assert_eq!(a.prompt, b.prompt);
        let png_a = std::fs::read(writer_a.task_dir().join(&a.first_frame)).unwrap();
        let png_b = std::fs::read(writer_b.task_dir().join(&b.first_frame)).unwrap();
        assert_eq!(png_a, png_b);
    }

    std::fs::remove_dir_all(&tmp_a).ok();
    std::fs::remove_dir_all(&tmp_b).ok();
}

#[test]
fn subset_mix_restricts_generated_types() {
    let tmp = temp_dir("subset");
    let writer = OutputWriter::new(&tmp, "traffic_light");
    let config = GenerateConfig {
        mix: TypeMix::uniform(&[TaskType::DualCountdown]).unwrap(),
        ..stills_only_config(11)
    };
    let mut generator = Generator::new(config).unwrap();

    let report = generator.generate(5, &writer).unwrap();
    assert_eq!(report.written, 5);
    assert_eq!(report.count_for(TaskType::DualCountdown), 5);

    let entries = read_manifest(&report.manifest_path.unwrap());
    assert!(entries.iter().all(|e| e.task_type == 3));

    std::fs::remove_dir_all(&tmp).ok();
}
