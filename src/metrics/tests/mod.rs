mod psnr;
mod ssim;
