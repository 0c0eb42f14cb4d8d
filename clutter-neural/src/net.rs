// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use candle_core::{Module, Result, Tensor};
use candle_nn::{Conv2d, Conv2dConfig, VarBuilder, conv2d};

/// Prefix of variables updated when only the heads are trained
pub const HEAD_PREFIX: &str = "head";

/// A small fully-convolutional foreground segmentation network
///
/// Three 3x3 backbone convolutions (the last one dilated) feed a 1x1 head
/// that predicts one foreground logit per pixel. Spatial size is preserved,
/// so any image size can be processed.
#[derive(Debug, Clone)]
pub struct ClutterNet {
    backbone: Vec<Conv2d>,
    head: Conv2d,
}

impl ClutterNet {
    pub fn new(vb: VarBuilder, hidden_channels: usize) -> Result<Self> {
        let same = Conv2dConfig {
            padding: 1,
            ..Default::default()
        };

        let dilated = Conv2dConfig {
            padding: 2,
            dilation: 2,
            ..Default::default()
        };

        let backbone_vb = vb.pp("backbone");
        let backbone = vec![
            conv2d(1, hidden_channels, 3, same, backbone_vb.pp("conv1"))?,
            conv2d(hidden_channels, hidden_channels, 3, same, backbone_vb.pp("conv2"))?,
            conv2d(hidden_channels, hidden_channels, 3, dilated, backbone_vb.pp("conv3"))?,
        ];

        let head = conv2d(
            hidden_channels,
            1,
            1,
            Conv2dConfig::default(),
            vb.pp(HEAD_PREFIX).pp("conv"),
        )?;

        Ok(ClutterNet { backbone, head })
    }
}

impl Module for ClutterNet {
    /// Map a (batch, 1, height, width) input to logits of the same shape
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mut xs = xs.clone();
        for conv in self.backbone.iter() {
            xs = conv.forward(&xs)?.relu()?;
        }

        self.head.forward(&xs)
    }
}
