use super::OrtBackend;
use crate::core::config::{
    OrtExecutionProvider, OrtGraphOptimizationLevel as OG, OrtSessionConfig,
};
use ort::execution_providers::ExecutionProviderDispatch;
use ort::logging::LogLevel;
use ort::session::builder::{GraphOptimizationLevel as GOL, SessionBuilder};

impl OrtBackend {
    pub(super) fn apply_ort_config(
        mut builder: SessionBuilder,
        cfg: &OrtSessionConfig,
    ) -> Result<SessionBuilder, ort::Error> {
        if let Some(intra) = cfg.intra_threads {
            builder = builder.with_intra_threads(intra)?;
        }
        if let Some(inter) = cfg.inter_threads {
            builder = builder.with_inter_threads(inter)?;
        }
        if let Some(level) = cfg.optimization_level {
            let mapped = match level {
                OG::DisableAll => GOL::Disable,
                OG::Level1 => GOL::Level1,
                OG::Level2 => GOL::Level2,
                OG::Level3 => GOL::Level3,
            };
            builder = builder.with_optimization_level(mapped)?;
        }
        if let Some(log_level) = cfg.log_severity_level {
            // 0=Verbose, 1=Info, 2=Warning, 3=Error, 4=Fatal
            let logging_level = match log_level {
                0 => LogLevel::Verbose,
                1 => LogLevel::Info,
                2 => LogLevel::Warning,
                3 => LogLevel::Error,
                _ => LogLevel::Fatal,
            };
            builder = builder.with_log_level(logging_level)?;
        }
        if let Some(eps) = &cfg.execution_providers {
            let providers = Self::build_execution_providers(eps)?;
            if !providers.is_empty() {
                builder = builder.with_execution_providers(providers)?;
            }
        }
        Ok(builder)
    }

    fn build_execution_providers(
        eps: &[OrtExecutionProvider],
    ) -> Result<Vec<ExecutionProviderDispatch>, ort::Error> {
        use crate::core::config::OrtExecutionProvider as EP;
        let mut providers = Vec::new();

        for ep in eps {
            match ep {
                EP::CPU => {
                    providers
                        .push(ort::execution_providers::CPUExecutionProvider::default().build());
                }
                #[cfg(feature = "coreml")]
                EP::CoreML {
                    ane_only,
                    subgraphs,
                } => {
                    use ort::execution_providers::coreml::CoreMLComputeUnits;
                    let mut coreml_provider =
                        ort::execution_providers::CoreMLExecutionProvider::default();
                    if let Some(true) = ane_only {
                        coreml_provider = coreml_provider
                            .with_compute_units(CoreMLComputeUnits::CPUAndNeuralEngine);
                    }
                    if let Some(sub) = subgraphs {
                        coreml_provider = coreml_provider.with_subgraphs(*sub);
                    }
                    providers.push(coreml_provider.build());
                }
                #[cfg(feature = "nnapi")]
                EP::NNAPI { fp16 } => {
                    let mut nnapi_provider =
                        ort::execution_providers::NNAPIExecutionProvider::default();
                    if let Some(enable) = fp16 {
                        nnapi_provider = nnapi_provider.with_fp16(*enable);
                    }
                    providers.push(nnapi_provider.build());
                }
                #[cfg(not(feature = "coreml"))]
                EP::CoreML { .. } => {
                    return Err(ort::Error::new(
                        "CoreML execution provider requested but coreml feature is not enabled",
                    ));
                }
                #[cfg(not(feature = "nnapi"))]
                EP::NNAPI { .. } => {
                    return Err(ort::Error::new(
                        "NNAPI execution provider requested but nnapi feature is not enabled",
                    ));
                }
            }
        }

        Ok(providers)
    }
}
