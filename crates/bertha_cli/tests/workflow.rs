#[macro_use]
extern crate util;

mod workflow_sequence_1 {
    use std::fs::{read_to_string, File};
    use std::io::Write;
    use std::path::PathBuf;

    use assert_cmd::Command;
    use indoc::indoc;
    use predicates::prelude::*;
    use serde_json::Value;
    use tempfile::tempdir;
    use util::test::{build_temp_file, prepare_args, print};

    /// A context, which will be dropped when the tests are completed.
    mod context {
        use std::fs;
        use std::path::Path;
        use std::sync::{Mutex, MutexGuard};
        use std::thread::sleep;
        use std::time::Duration;

        use super::*;

        #[derive(Debug)]
        pub struct Context {
            pub temp_dir: tempfile::TempDir,

            pub trace_log_arg: String,
            pub sources_arg: String,
            pub path_arg: String,
            pub workflow_arg: String,
            pub test_trace_log_path: PathBuf,
            pub test_sources_path: PathBuf,
            pub test_workflow_path: PathBuf,
            pub reports_path: PathBuf,
            pub models_path: PathBuf,
            pub recipes_path: PathBuf,
        }

        impl Context {
            pub fn new() -> Self {
                let temp_dir = tempdir().unwrap();

                let path_arg = format!("--path {}", temp_dir.path().to_str().unwrap());

                let (test_trace_log_path, _test_trace_log_file_name) = build_temp_file(&temp_dir, "trace", "log");
                let trace_log_arg = format!("--trace {}", test_trace_log_path.to_str().unwrap());

                let (test_sources_path, _test_sources_file_name) = build_temp_file(&temp_dir, "sources", "csv");
                let sources_arg = format!("--sources {}", test_sources_path.to_str().unwrap());

                let (test_workflow_path, _test_workflow_file_name) =
                    build_temp_file(&temp_dir, "workflow-job1", "json");

                let workflow_arg = "--workflow job1".to_string();

                let reports_path = temp_dir.path().join("reports");
                let models_path = temp_dir.path().join("models");
                let recipes_path = temp_dir.path().join("recipes");

                Context {
                    temp_dir,
                    trace_log_arg,
                    sources_arg,
                    path_arg,
                    workflow_arg,
                    test_trace_log_path,
                    test_sources_path,
                    test_workflow_path,
                    reports_path,
                    models_path,
                    recipes_path,
                }
            }

            pub fn delete_trace_log(&self) {
                if Path::new(&self.test_trace_log_path).exists() {
                    println!(
                        "deleting trace log: {}",
                        self.test_trace_log_path
                            .to_str()
                            .unwrap()
                    );
                    fs::remove_file(&self.test_trace_log_path).unwrap();
                }
            }

            pub fn training_set_path(&self, name: &str) -> PathBuf {
                self.reports_path.join(name)
            }
        }

        impl Drop for Context {
            fn drop(&mut self) {
                println!(
                    "destroying context. temp_dir: {}",
                    self.temp_dir.path().to_str().unwrap()
                );
            }
        }

        /// IMPORTANT: lock content must be dropped manually, as static items are never dropped.
        static LOCK: Mutex<(usize, Option<Context>)> = Mutex::new((0, None));

        /// Tests in this module share the context and must run in sequence, each test waits for its turn.
        pub fn acquire(sequence: usize) -> MutexGuard<'static, (usize, Option<Context>)> {
            let mut lock = loop {
                let mut lock = LOCK
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                if lock.0 == sequence - 1 {
                    lock.0 += 1;
                    break lock;
                }
                drop(lock);

                sleep(Duration::from_millis(100));
            };

            if lock.1.is_none() {
                lock.1.replace(Context::new());
            }

            lock
        }
    }

    fn write_training_set(path: &PathBuf, content: &str) -> Result<(), anyhow::Error> {
        std::fs::create_dir_all(path)?;
        let mut file = File::create(path.join("learning_data.csv"))?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    #[test]
    fn sequence_01_set_source_field() -> Result<(), anyhow::Error> {
        // given
        let mut ctx_guard = context::acquire(1);
        let ctx = ctx_guard.1.as_mut().unwrap();

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bertha_cli"));

        // and
        let args = prepare_args(vec![
            ctx.trace_log_arg.as_str(),
            ctx.sources_arg.as_str(),
            "-vvv",
            "sources",
            "set",
            "--source 5",
            "--field max-power",
            "--value 65",
        ]);
        println!("args: {:?}", args);

        // when
        cmd.args(args)
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout"));

        // and
        let trace_content: String = read_to_string(ctx.test_trace_log_path.clone())?;
        println!("{}", trace_content);

        assert_contains_inorder!(trace_content, [
            "Source configuration not found, using defaults.",
            "Source configuration updated. source: 5, field: max_power, value: '65'",
            "Storing source configuration.",
        ]);

        // and
        let sources_content: String = read_to_string(ctx.test_sources_path.clone())?;
        println!("{}", sources_content);

        assert!(sources_content.contains(r#""5","Ba","5","Ba_01","3","RF","65","5","50","0""#));

        Ok(())
    }

    #[test]
    fn sequence_02_create_workflow() -> Result<(), anyhow::Error> {
        // given
        let mut ctx_guard = context::acquire(2);
        let ctx = ctx_guard.1.as_mut().unwrap();
        ctx.delete_trace_log();

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bertha_cli"));

        // and
        let expected_workflow_content = indoc! {r#"
            {
                "target materials": [
                    "Zr",
                    "CuS",
                    "Sn",
                    "SnS",
                    "Ba",
                    "ZnS"
                ],
                "active_sources": [
                    true,
                    true,
                    false,
                    false,
                    false,
                    false
                ]
            }
        "#};

        // and
        let args = prepare_args(vec![
            ctx.trace_log_arg.as_str(),
            ctx.sources_arg.as_str(),
            "-vvv",
            "workflow",
            ctx.path_arg.as_str(),
            ctx.workflow_arg.as_str(),
            "create",
            "--source 1",
            "--source 2",
        ]);
        println!("args: {:?}", args);

        // when
        cmd.args(args)
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout"));

        // and
        let trace_content: String = read_to_string(ctx.test_trace_log_path.clone())?;
        println!("{}", trace_content);

        assert_contains_inorder!(trace_content, [
            "Loading source configuration.",
            "Creating workflow.",
            "Created workflow. ",
            "active_materials: [Zr, CuS]",
            "Created workflow successfully.",
        ]);

        // and
        let workflow_content: String = read_to_string(ctx.test_workflow_path.clone())?;
        println!("{}", workflow_content);

        assert_eq!(workflow_content, expected_workflow_content);

        Ok(())
    }

    #[test]
    fn sequence_03_create_workflow_with_one_source_fails() -> Result<(), anyhow::Error> {
        // given
        let mut ctx_guard = context::acquire(3);
        let ctx = ctx_guard.1.as_mut().unwrap();
        ctx.delete_trace_log();

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bertha_cli"));

        // and
        let args = prepare_args(vec![
            ctx.trace_log_arg.as_str(),
            ctx.sources_arg.as_str(),
            "workflow",
            ctx.path_arg.as_str(),
            "--workflow job2",
            "create",
            "--source 3",
        ]);
        println!("args: {:?}", args);

        // when
        cmd.args(args)
            // then
            .assert()
            .failure()
            .stderr(print("stderr").and(predicate::str::contains("Too few sources. active: 1, required: 2")))
            .stdout(print("stdout"));

        // and
        assert!(!ctx
            .temp_dir
            .path()
            .join("workflow-job2.json")
            .exists());

        Ok(())
    }

    #[test]
    fn sequence_04_bind_composition() -> Result<(), anyhow::Error> {
        // given
        let mut ctx_guard = context::acquire(4);
        let ctx = ctx_guard.1.as_mut().unwrap();
        ctx.delete_trace_log();

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bertha_cli"));

        // and
        let args = prepare_args(vec![
            ctx.trace_log_arg.as_str(),
            ctx.sources_arg.as_str(),
            "-vvv",
            "workflow",
            ctx.path_arg.as_str(),
            ctx.workflow_arg.as_str(),
            "bind-composition",
            "--value Zr=10",
            "--value CuS=5",
        ]);
        println!("args: {:?}", args);

        // when
        cmd.args(args)
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout"));

        // and
        let trace_content: String = read_to_string(ctx.test_trace_log_path.clone())?;
        println!("{}", trace_content);

        assert_contains_inorder!(trace_content, [
            "Load workflow.",
            "Loaded workflow. ",
            "compositions: 0, models: 0",
            "Bound target composition. index: 0, composition: [Zr=10, CuS=5]",
            "Stage enabled. stage: 'Find Boundaries'",
        ]);

        // and
        let workflow_content: Value = serde_json::from_str(&read_to_string(ctx.test_workflow_path.clone())?)?;
        println!("{}", workflow_content);

        assert_eq!(
            workflow_content["target_compositions"],
            serde_json::json!([{"Zr": 10, "CuS": 5}])
        );

        Ok(())
    }

    #[test]
    fn sequence_05_bind_composition_with_too_few_values_fails() -> Result<(), anyhow::Error> {
        // given
        let mut ctx_guard = context::acquire(5);
        let ctx = ctx_guard.1.as_mut().unwrap();
        ctx.delete_trace_log();

        // and
        let workflow_content_before: String = read_to_string(ctx.test_workflow_path.clone())?;

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bertha_cli"));

        // and
        let args = prepare_args(vec![
            ctx.trace_log_arg.as_str(),
            ctx.sources_arg.as_str(),
            "workflow",
            ctx.path_arg.as_str(),
            ctx.workflow_arg.as_str(),
            "bind-composition",
            "--value Zr=10",
            "--value CuS=0",
        ]);
        println!("args: {:?}", args);

        // when
        cmd.args(args)
            // then
            .assert()
            .failure()
            .stderr(print("stderr").and(predicate::str::contains("Too few non-zero values. non_zero: 1, required: 2")))
            .stdout(print("stdout"));

        // and
        let workflow_content: String = read_to_string(ctx.test_workflow_path.clone())?;
        assert_eq!(workflow_content, workflow_content_before);

        Ok(())
    }

    #[test]
    fn sequence_06_list_training_sets() -> Result<(), anyhow::Error> {
        // given
        let mut ctx_guard = context::acquire(6);
        let ctx = ctx_guard.1.as_mut().unwrap();
        ctx.delete_trace_log();

        // and
        write_training_set(
            &ctx.training_set_path("20240502_EE_LearnMinimumRate_([1])"),
            "power,rate\n30,1.5\n",
        )?;
        write_training_set(
            &ctx.training_set_path("20240501_EE_LearnMinimumRate_([1])"),
            "power,rate\n10,0.5\n20,1.25\n",
        )?;
        write_training_set(
            &ctx.training_set_path("20240501_EE_LearnMinimumRate_([2])"),
            "power,rate\n10,0.25\n",
        )?;

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bertha_cli"));

        // and
        let reports_arg = format!("--reports {}", ctx.reports_path.to_str().unwrap());
        let args = prepare_args(vec![
            ctx.trace_log_arg.as_str(),
            ctx.sources_arg.as_str(),
            "workflow",
            ctx.path_arg.as_str(),
            ctx.workflow_arg.as_str(),
            "list-training-sets",
            "--kind EE",
            "--material Zr",
            reports_arg.as_str(),
        ]);
        println!("args: {:?}", args);

        // when
        let assert = cmd
            .args(args)
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout"));

        // and
        let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
        assert_contains_inorder!(stdout, [
            "20240501_EE_LearnMinimumRate_([1])",
            "20240502_EE_LearnMinimumRate_([1])",
        ]);
        assert!(!stdout.contains("([2])"));

        // and
        let trace_content: String = read_to_string(ctx.test_trace_log_path.clone())?;
        assert_contains_inorder!(trace_content, ["Found training sets. kind: EE, source: 1, count: 2"]);

        Ok(())
    }

    #[test]
    fn sequence_07_show_training_data() -> Result<(), anyhow::Error> {
        // given
        let mut ctx_guard = context::acquire(7);
        let ctx = ctx_guard.1.as_mut().unwrap();
        ctx.delete_trace_log();

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bertha_cli"));

        // and
        let first_arg = format!(
            "--training-set {}",
            ctx.training_set_path("20240501_EE_LearnMinimumRate_([1])")
                .to_str()
                .unwrap()
        );
        let second_arg = format!(
            "--training-set {}",
            ctx.training_set_path("20240502_EE_LearnMinimumRate_([1])")
                .to_str()
                .unwrap()
        );
        let args = prepare_args(vec![
            ctx.trace_log_arg.as_str(),
            ctx.sources_arg.as_str(),
            "workflow",
            ctx.path_arg.as_str(),
            ctx.workflow_arg.as_str(),
            "show-training-data",
            "--kind EE",
            "--material Zr",
            first_arg.as_str(),
            second_arg.as_str(),
        ]);
        println!("args: {:?}", args);

        // and
        let expected_table = indoc! {"
            power  rate
               10   0.5
               20  1.25
               30   1.5
        "};

        // when
        cmd.args(args)
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout").and(predicate::str::contains("Rows: 3").and(predicate::str::contains(expected_table))));

        Ok(())
    }

    #[test]
    fn sequence_08_train_model() -> Result<(), anyhow::Error> {
        // given
        let mut ctx_guard = context::acquire(8);
        let ctx = ctx_guard.1.as_mut().unwrap();
        ctx.delete_trace_log();

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bertha_cli"));

        // and
        let training_set_arg = format!(
            "--training-set {}",
            ctx.training_set_path("20240501_EE_LearnMinimumRate_([1])")
                .to_str()
                .unwrap()
        );
        let models_arg = format!("--models {}", ctx.models_path.to_str().unwrap());
        let args = prepare_args(vec![
            ctx.trace_log_arg.as_str(),
            ctx.sources_arg.as_str(),
            "-vvv",
            "workflow",
            ctx.path_arg.as_str(),
            ctx.workflow_arg.as_str(),
            "train-model",
            "--kind EE",
            "--material Zr",
            training_set_arg.as_str(),
            models_arg.as_str(),
        ]);
        println!("args: {:?}", args);

        // when
        cmd.args(args)
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout").and(predicate::str::contains("Trained model: ")));

        // and
        let trace_content: String = read_to_string(ctx.test_trace_log_path.clone())?;
        println!("{}", trace_content);

        assert_contains_inorder!(trace_content, [
            "Loaded training data. ",
            "Trained placeholder model. kind: EE, material: 'Zr', rows: 2, training_sets: 1",
            "Stored model. kind: EE, material: 'Zr'",
        ]);

        // and
        assert!(ctx
            .models_path
            .join("EE_model_Zr_1")
            .join("model.json")
            .exists());

        Ok(())
    }

    #[test]
    fn sequence_09_bind_model() -> Result<(), anyhow::Error> {
        // given
        let mut ctx_guard = context::acquire(9);
        let ctx = ctx_guard.1.as_mut().unwrap();
        ctx.delete_trace_log();

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bertha_cli"));

        // and
        let model_path = ctx.models_path.join("EE_model_Zr_1");
        let model_arg = format!("--model {}", model_path.to_str().unwrap());
        let args = prepare_args(vec![
            ctx.trace_log_arg.as_str(),
            ctx.sources_arg.as_str(),
            "-vvv",
            "workflow",
            ctx.path_arg.as_str(),
            ctx.workflow_arg.as_str(),
            "bind-model",
            "--kind EE",
            "--material Zr",
            model_arg.as_str(),
        ]);
        println!("args: {:?}", args);

        // when
        cmd.args(args)
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout"));

        // and
        let trace_content: String = read_to_string(ctx.test_trace_log_path.clone())?;
        println!("{}", trace_content);

        assert_contains_inorder!(trace_content, [
            "Loaded workflow. ",
            "Bound model. kind: EE, material: 'Zr'",
            "Stage enabled. stage: 'Learn Sputter Process'",
        ]);

        // and stages unlocked by earlier runs are not reported again
        assert!(!trace_content.contains("Stage enabled. stage: 'Find Boundaries'"));

        // and
        let workflow_content: Value = serde_json::from_str(&read_to_string(ctx.test_workflow_path.clone())?)?;
        println!("{}", workflow_content);

        assert_eq!(
            workflow_content["EE_model_Zr"],
            Value::String(model_path.to_str().unwrap().to_string())
        );

        Ok(())
    }

    #[test]
    fn sequence_10_rebind_model_fails() -> Result<(), anyhow::Error> {
        // given
        let mut ctx_guard = context::acquire(10);
        let ctx = ctx_guard.1.as_mut().unwrap();
        ctx.delete_trace_log();

        // and another model
        let model_path = ctx.models_path.join("EE_model_Zr_2");
        std::fs::create_dir_all(&model_path)?;

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bertha_cli"));

        // and
        let model_arg = format!("--model {}", model_path.to_str().unwrap());
        let args = prepare_args(vec![
            ctx.trace_log_arg.as_str(),
            ctx.sources_arg.as_str(),
            "workflow",
            ctx.path_arg.as_str(),
            ctx.workflow_arg.as_str(),
            "bind-model",
            "--kind EE",
            "--material Zr",
            model_arg.as_str(),
        ]);
        println!("args: {:?}", args);

        // when
        cmd.args(args)
            // then
            .assert()
            .failure()
            .stderr(print("stderr").and(predicate::str::contains("Model already bound. kind: EE, material: 'Zr'")))
            .stdout(print("stdout"));

        Ok(())
    }

    #[test]
    fn sequence_11_show_stages() -> Result<(), anyhow::Error> {
        // given
        let mut ctx_guard = context::acquire(11);
        let ctx = ctx_guard.1.as_mut().unwrap();
        ctx.delete_trace_log();

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bertha_cli"));

        // and
        let args = prepare_args(vec![
            ctx.trace_log_arg.as_str(),
            ctx.sources_arg.as_str(),
            "workflow",
            ctx.path_arg.as_str(),
            ctx.workflow_arg.as_str(),
            "stages",
        ]);
        println!("args: {:?}", args);

        // and
        let expected_stages = indoc! {"
            Stage 0: Define Target Compositions, enabled
            Stage 1: Find Boundaries, enabled
            Stage 2: Learn Sputter Process, enabled
            Stage 3: Calibrate Compositions, disabled
            Stage 4: Learn Feature Map, disabled
            Stage 5: Feature Identification, disabled
            Composition 1: Zr=10, CuS=5
        "};

        // when
        cmd.args(args)
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout").and(predicate::str::contains(expected_stages)));

        Ok(())
    }

    #[test]
    fn sequence_12_list_and_show_recipes() -> Result<(), anyhow::Error> {
        // given
        let mut ctx_guard = context::acquire(12);
        let ctx = ctx_guard.1.as_mut().unwrap();
        ctx.delete_trace_log();

        // and
        std::fs::create_dir_all(&ctx.recipes_path)?;
        std::fs::write(ctx.recipes_path.join("presputter.txt"), "ramp 5\n")?;
        std::fs::write(ctx.recipes_path.join("deposition.txt"), "ramp 10\nhold 60\n")?;

        // and
        let recipes_path_arg = format!("--path {}", ctx.recipes_path.to_str().unwrap());

        // when
        Command::new(env!("CARGO_BIN_EXE_bertha_cli"))
            .args(prepare_args(vec![
                ctx.sources_arg.as_str(),
                "recipes",
                recipes_path_arg.as_str(),
                "list",
            ]))
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout").and(predicate::str::contains("deposition.txt\npresputter.txt\n")));

        // and when
        Command::new(env!("CARGO_BIN_EXE_bertha_cli"))
            .args(prepare_args(vec![
                ctx.sources_arg.as_str(),
                "recipes",
                recipes_path_arg.as_str(),
                "show",
                "--name deposition.txt",
            ]))
            // then
            .assert()
            .success()
            .stderr(print("stderr"))
            .stdout(print("stdout").and(predicate::str::contains("ramp 10\nhold 60\n")));

        Ok(())
    }

    #[test]
    fn sequence_13_create_existing_workflow_fails() -> Result<(), anyhow::Error> {
        // given
        let mut ctx_guard = context::acquire(13);
        let ctx = ctx_guard.1.as_mut().unwrap();
        ctx.delete_trace_log();

        // and
        let workflow_content_before: String = read_to_string(ctx.test_workflow_path.clone())?;

        // and
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bertha_cli"));

        // and
        let args = prepare_args(vec![
            ctx.trace_log_arg.as_str(),
            ctx.sources_arg.as_str(),
            "workflow",
            ctx.path_arg.as_str(),
            ctx.workflow_arg.as_str(),
            "create",
            "--source 1",
            "--source 2",
        ]);
        println!("args: {:?}", args);

        // when
        cmd.args(args)
            // then
            .assert()
            .failure()
            .stderr(print("stderr").and(predicate::str::contains("Session file already exists.")))
            .stdout(print("stdout"));

        // and the bound composition and model are kept
        let workflow_content: String = read_to_string(ctx.test_workflow_path.clone())?;
        assert_eq!(workflow_content, workflow_content_before);
        assert!(workflow_content.contains("\"EE_model_Zr\""));

        Ok(())
    }

    #[test]
    fn sequence_14_cleanup() {
        let mut ctx_guard = context::acquire(14);
        let ctx = ctx_guard.1.take().unwrap();
        drop(ctx);
    }
}
