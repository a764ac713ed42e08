use crate::cli::CallArgs;
use crate::srgt::{
    classify::ZygosityModel,
    sample::{stream_samples_into_channel, SamplePair},
    workflows::{self, analyze_sample, SampleResult},
    writers::{GenotypeWriter, MosaicismWriter},
};
use crate::utils::{create_writer, Result};
use crossbeam_channel::{bounded, Sender};
use rayon::{
    iter::{ParallelBridge, ParallelIterator},
    ThreadPoolBuilder,
};
use std::{sync::Arc, thread};

const CHANNEL_BUFFER_SIZE: usize = 2048;

pub fn call(args: CallArgs) -> Result<()> {
    let model = Arc::new(ZygosityModel::from_path(&args.model_path)?);

    let mut genotype_writer = create_writer(&args.output_prefix, "genotypes.tsv", |path| {
        GenotypeWriter::new(path)
    })?;
    let mut mosaicism_writer = create_writer(&args.output_prefix, "mosaicism.tsv", |path| {
        MosaicismWriter::new(path)
    })?;

    if let Some(plot_dir) = &args.plot_dir {
        std::fs::create_dir_all(plot_dir)
            .map_err(|e| format!("Cannot create {}: {}", plot_dir.display(), e))?;
    }

    let (sender_sample, receiver_sample) = bounded(CHANNEL_BUFFER_SIZE);
    let manifest_path = args.manifest_path.clone();
    let sample_stream_thread =
        thread::spawn(move || stream_samples_into_channel(&manifest_path, sender_sample));

    let (sender_result, receiver_result) = bounded::<(String, SampleResult)>(CHANNEL_BUFFER_SIZE);
    let writer_thread = thread::spawn(move || {
        for (sample_id, result) in &receiver_result {
            if let Err(e) = genotype_writer.write(&sample_id, &result) {
                log::error!("{}: failed to write genotype row: {}", sample_id, e);
            }
            if let Err(e) = mosaicism_writer.write(&sample_id, &result) {
                log::error!("{}: failed to write mosaicism rows: {}", sample_id, e);
            }
        }
    });

    let workflow_params = Arc::new(workflows::Params {
        max_peak_recalls: args.max_peak_recalls,
        plot_dir: args.plot_dir.clone(),
    });

    log::debug!(
        "Initializing thread pool with {} threads...",
        args.num_threads
    );
    let pool = initialize_thread_pool(args.num_threads)?;
    pool.install(|| {
        receiver_sample
            .into_iter()
            .par_bridge()
            .for_each_with(&sender_result, |s, sample_result| match sample_result {
                Ok(sample) => process_sample(sample, &model, &workflow_params, s),
                Err(err) => log::error!("Sample processing: {}", err),
            });
    });

    // Clean-up
    drop(sender_result);
    writer_thread.join().expect("Writer thread panicked");
    log::trace!("Writer thread finished");
    sample_stream_thread
        .join()
        .expect("Sample stream thread panicked");
    log::trace!("Sample stream thread finished");

    Ok(())
}

fn process_sample(
    sample: SamplePair,
    model: &Arc<ZygosityModel>,
    workflow_params: &Arc<workflows::Params>,
    sender_result: &Sender<(String, SampleResult)>,
) {
    match analyze_sample(&sample, model, workflow_params) {
        Ok(result) => {
            if let Err(e) = sender_result.send((sample.id, result)) {
                log::error!("Failed to send sample result to writer thread: {}", e);
            }
        }
        Err(err) => {
            log::error!("Error analyzing sample {}: {}", sample.id, err);
        }
    }
}

fn initialize_thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("srgt-{}", i))
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))
}
